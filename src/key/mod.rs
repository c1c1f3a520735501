// Copyright (C) Microsoft Corporation. All rights reserved.

//! Key attributes and owned key material.
//!
//! The engine does not manage key lifecycle; the calling provider core hands
//! it raw key bytes plus the attributes it stores alongside them. The engine
//! enforces the usage policy those attributes carry and keeps its own copy of
//! the key material, wiped on every exit path.

use super::*;
use zeroize::Zeroize;

/// Permitted operations for a key, as recorded by the key store.
///
/// Setup in a direction the flags do not permit fails with
/// [`CipherError::NotPermitted`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct KeyUsage {
    encrypt: bool,
    decrypt: bool,
}

impl KeyUsage {
    /// Usage permitting both encryption and decryption.
    pub fn encrypt_decrypt() -> Self {
        Self {
            encrypt: true,
            decrypt: true,
        }
    }

    /// Usage permitting encryption only.
    pub fn encrypt_only() -> Self {
        Self {
            encrypt: true,
            decrypt: false,
        }
    }

    /// Usage permitting decryption only.
    pub fn decrypt_only() -> Self {
        Self {
            encrypt: false,
            decrypt: true,
        }
    }

    /// Returns `true` if the flags permit the given direction.
    pub fn allows(&self, direction: Direction) -> bool {
        match direction {
            Direction::Encrypt => self.encrypt,
            Direction::Decrypt => self.decrypt,
        }
    }
}

/// Attributes the key store supplies with a key's raw bytes.
///
/// Only the usage flags matter to this engine; key type and policy
/// enforcement beyond usage live with the key store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyAttributes {
    usage: KeyUsage,
}

impl KeyAttributes {
    /// Creates attributes with the given usage flags.
    pub fn new(usage: KeyUsage) -> Self {
        Self { usage }
    }

    /// Returns the key's usage flags.
    pub fn usage(&self) -> KeyUsage {
        self.usage
    }
}

/// Owned copy of a key's raw bytes.
///
/// The operation copies key material at setup so the caller's buffer need
/// not outlive the call, and wipes the copy on finish, on abort, and on
/// drop. After a wipe the material is empty and unusable.
pub(crate) struct KeyMaterial {
    bytes: Vec<u8>,
}

impl KeyMaterial {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Zeroes the key bytes in place and empties the buffer.
    pub(crate) fn wipe(&mut self) {
        self.bytes.zeroize();
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

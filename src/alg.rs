// Copyright (C) Microsoft Corporation. All rights reserved.

//! Cipher algorithm and direction definitions.
//!
//! The algorithm table is the single source of truth for per-mode
//! requirements: IV length, block alignment, and padding. Every validation
//! rule in the operation state machine derives from the answers here.

use super::*;

/// AES block size in bytes.
///
/// AES always operates on 128-bit (16-byte) blocks regardless of key size.
pub const AES_BLOCK_SIZE: usize = 16;

/// Supported cipher modes.
///
/// The enum is represented as a u32 to ensure compatibility with C APIs and
/// consistent memory layout across different platforms. Use
/// [`TryFrom<u32>`] to map a raw algorithm identifier from a caller;
/// identifiers outside this table are rejected with
/// [`CipherError::NotSupported`].
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, strum_macros::FromRepr)]
pub enum CipherAlg {
    /// AES-ECB without padding.
    ///
    /// Takes no IV. Total input must be a multiple of the block size.
    /// Each block is encrypted independently, so identical plaintext blocks
    /// produce identical ciphertext blocks; prefer a chained mode unless a
    /// higher-level protocol accounts for that.
    EcbNoPadding = 1,

    /// AES-CBC without padding.
    ///
    /// Takes a 16-byte IV. Total input must be a multiple of the block size.
    CbcNoPadding = 2,

    /// AES-CBC with PKCS#7 padding.
    ///
    /// Takes a 16-byte IV. Accepts input of any length; encryption always
    /// appends a padding block or partial-block padding, and decryption
    /// validates and strips it.
    CbcPkcs7 = 3,

    /// AES-CTR.
    ///
    /// Takes a 16-byte initial counter value. Stream mode: accepts input of
    /// any length with no padding.
    Ctr = 4,
}

impl TryFrom<u32> for CipherAlg {
    type Error = CipherError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(CipherError::NotSupported)
    }
}

impl CipherAlg {
    /// Returns the required IV (or initial counter) length in bytes, or
    /// `None` for modes that take no IV.
    pub fn iv_size(&self) -> Option<usize> {
        match self {
            CipherAlg::EcbNoPadding => None,
            CipherAlg::CbcNoPadding | CipherAlg::CbcPkcs7 | CipherAlg::Ctr => {
                Some(AES_BLOCK_SIZE)
            }
        }
    }

    /// Returns `true` for modes whose total input must be a whole number of
    /// blocks.
    pub fn needs_alignment(&self) -> bool {
        matches!(self, CipherAlg::EcbNoPadding | CipherAlg::CbcNoPadding)
    }

    /// Returns `true` for modes that apply PKCS#7 padding.
    pub fn padded(&self) -> bool {
        matches!(self, CipherAlg::CbcPkcs7)
    }

    /// Validates that the key size is valid for AES.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidArgument` if the key size is not 16, 24,
    /// or 32 bytes.
    pub(crate) fn validate_key_size(&self, key_size: usize) -> Result<(), CipherError> {
        match key_size {
            16 | 24 | 32 => Ok(()),
            _ => Err(CipherError::InvalidArgument),
        }
    }
}

/// Direction of a cipher operation, fixed at setup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

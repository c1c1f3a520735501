// Copyright (C) Microsoft Corporation. All rights reserved.

//! Block-transform backend interface.
//!
//! The AES primitive itself — hardware accelerator or software library — sits
//! behind the [`BlockTransform`] trait. The operation state machine owns all
//! chaining state (CBC running IV, CTR counter) and padding, so a backend
//! only ever transforms raw data with an explicit chain value. One request
//! maps to one backend invocation; the engine never retries a failed request.

use super::*;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod ossl;
        pub use ossl::OsslAesTransform;

        /// Default block transform for the current platform.
        pub type AesTransform = ossl::OsslAesTransform;
    } else {
        compile_error!("Unsupported target OS for the AES block transform");
    }
}

/// Failure signal from a block-transform backend.
///
/// The engine translates these into [`CipherError`] without retrying;
/// retries, if any, are the backend's own concern.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Transport to the backend failed.
    Communication,
    /// The backend itself failed.
    Hardware,
}

impl From<TransformError> for CipherError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Communication => CipherError::CommunicationFailure,
            TransformError::Hardware => CipherError::HardwareFailure,
        }
    }
}

/// One invocation of the block transform.
///
/// `chain` carries the CBC IV or CTR counter for this run and is `None` for
/// ECB. `input` is a whole number of blocks, except in CTR mode where the
/// final run may be a sub-block remainder.
pub struct TransformRequest<'a> {
    /// Raw AES key bytes (16, 24, or 32).
    pub key: &'a [u8],
    /// Cipher mode to apply.
    pub alg: CipherAlg,
    /// Encrypt or decrypt.
    pub direction: Direction,
    /// Chain value for this run, if the mode uses one.
    pub chain: Option<&'a [u8; AES_BLOCK_SIZE]>,
    /// Data to transform.
    pub input: &'a [u8],
}

/// An AES block-transform backend.
///
/// Implementations transform `req.input` and write exactly
/// `req.input.len()` bytes to the front of `output`. The engine guarantees
/// `output` is large enough and that the request is well formed (validated
/// key size, correct chain presence, block-aligned input outside CTR).
pub trait BlockTransform {
    /// Transforms one run of data.
    fn transform(
        &self,
        req: &TransformRequest<'_>,
        output: &mut [u8],
    ) -> Result<(), TransformError>;
}

// Copyright (C) Microsoft Corporation. All rights reserved.

//! OpenSSL-based software block transform.
//!
//! This backend drives AES through OpenSSL's `Crypter` with padding disabled;
//! the operation state machine supplies the chain value per run and handles
//! padding itself. Each request constructs a fresh cipher context, so the
//! backend holds no state between invocations and is safe to share across
//! operations.

use openssl::symm::*;
use zeroize::Zeroize;

use super::*;

/// Intermediate buffer length for relaying OpenSSL output.
///
/// OpenSSL requires its output buffer to have one block of slack beyond the
/// input length, which the engine's exact-size output contract does not
/// provide. Runs are relayed through a fixed stack buffer instead; the slack
/// lives there.
const SCRATCH_LEN: usize = 1024;

/// OpenSSL AES block-transform backend.
#[derive(Default)]
pub struct OsslAesTransform;

impl OsslAesTransform {
    /// Returns the OpenSSL cipher for the requested mode and key size.
    fn cipher(alg: CipherAlg, key_size: usize) -> Result<Cipher, TransformError> {
        let cipher = match (alg, key_size) {
            (CipherAlg::EcbNoPadding, 16) => Cipher::aes_128_ecb(),
            (CipherAlg::EcbNoPadding, 24) => Cipher::aes_192_ecb(),
            (CipherAlg::EcbNoPadding, 32) => Cipher::aes_256_ecb(),
            (CipherAlg::CbcNoPadding | CipherAlg::CbcPkcs7, 16) => Cipher::aes_128_cbc(),
            (CipherAlg::CbcNoPadding | CipherAlg::CbcPkcs7, 24) => Cipher::aes_192_cbc(),
            (CipherAlg::CbcNoPadding | CipherAlg::CbcPkcs7, 32) => Cipher::aes_256_cbc(),
            (CipherAlg::Ctr, 16) => Cipher::aes_128_ctr(),
            (CipherAlg::Ctr, 24) => Cipher::aes_192_ctr(),
            (CipherAlg::Ctr, 32) => Cipher::aes_256_ctr(),
            // Key sizes are validated at setup; a mismatch here is a backend
            // contract violation.
            _ => {
                tracing::error!(alg = ?alg, key_size, "no cipher for transform request");
                return Err(TransformError::Hardware);
            }
        };
        Ok(cipher)
    }
}

impl BlockTransform for OsslAesTransform {
    fn transform(
        &self,
        req: &TransformRequest<'_>,
        output: &mut [u8],
    ) -> Result<(), TransformError> {
        let cipher = Self::cipher(req.alg, req.key.len())?;
        let mode = match req.direction {
            Direction::Encrypt => Mode::Encrypt,
            Direction::Decrypt => Mode::Decrypt,
        };
        let iv = req.chain.map(|chain| chain.as_slice());

        let mut crypter = Crypter::new(cipher, mode, req.key, iv).map_err(|openssl_error_stack| {
            tracing::error!(?openssl_error_stack);
            TransformError::Hardware
        })?;
        crypter.pad(false);

        let mut scratch = [0u8; SCRATCH_LEN];
        let mut written = 0;
        for run in req.input.chunks(SCRATCH_LEN - AES_BLOCK_SIZE) {
            let count = crypter
                .update(run, &mut scratch)
                .map_err(|openssl_error_stack| {
                    tracing::error!(?openssl_error_stack);
                    scratch.zeroize();
                    TransformError::Hardware
                })?;
            output[written..written + count].copy_from_slice(&scratch[..count]);
            written += count;
        }
        let count = crypter
            .finalize(&mut scratch)
            .map_err(|openssl_error_stack| {
                tracing::error!(?openssl_error_stack);
                scratch.zeroize();
                TransformError::Hardware
            })?;
        output[written..written + count].copy_from_slice(&scratch[..count]);
        written += count;
        scratch.zeroize();

        debug_assert!(written == req.input.len());
        Ok(())
    }
}

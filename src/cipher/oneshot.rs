// Copyright (C) Microsoft Corporation. All rights reserved.

//! One-shot cipher facade.
//!
//! Composes setup, IV binding, update, and finish into a single call for
//! callers with the entire message in hand. The facade validates the total
//! output length up front so a failing call never leaves partial output, and
//! aborts the underlying operation on any sub-step failure, propagating that
//! sub-step's error unchanged.

use super::*;

/// One-shot encryption and decryption over the platform block transform.
pub struct Cipher;

impl Cipher {
    /// Encrypts a complete message in a single call.
    ///
    /// `iv` must be present exactly when the mode takes one; the provider
    /// core is expected to have generated it. The output is ciphertext only
    /// — the caller owns IV framing.
    ///
    /// # Arguments
    ///
    /// * `attributes` - Attributes stored with the key; must permit encryption
    /// * `key` - Raw AES key bytes (16, 24, or 32)
    /// * `alg` - Cipher mode to apply
    /// * `iv` - IV or initial counter for modes that take one, else `None`
    /// * `input` - Complete plaintext
    /// * `output` - Optional output buffer. If `None`, returns the exact
    ///   output size for this input.
    ///
    /// # Errors
    ///
    /// - `CipherError::InvalidArgument` - Input violates the mode's block
    ///   alignment, the IV is wrong, or the IV's presence disagrees with the
    ///   mode
    /// - `CipherError::BufferTooSmall` - `output` cannot hold the complete
    ///   result; nothing is written
    /// - `CipherError::NotPermitted` - The key's usage flags do not allow
    ///   encryption
    pub fn encrypt(
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
        iv: Option<&[u8]>,
        input: &[u8],
        output: Option<&mut [u8]>,
    ) -> Result<usize, CipherError> {
        let required = Self::encrypt_output_len(alg, input.len())?;
        let Some(output) = output else {
            return Ok(required);
        };
        if output.len() < required {
            return Err(CipherError::BufferTooSmall);
        }

        let mut op = CipherOperation::encrypt_setup(attributes, key, alg)?;
        match Self::run_encrypt(&mut op, iv, input, output) {
            Ok(count) => Ok(count),
            Err(err) => {
                let _ = op.abort();
                Err(err)
            }
        }
    }

    /// Encrypts a complete message and returns the result as a new vector.
    pub fn encrypt_vec(
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
        iv: Option<&[u8]>,
        input: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let required = Self::encrypt(attributes, key, alg, iv, input, None)?;
        let mut output = vec![0u8; required];
        let written = Self::encrypt(attributes, key, alg, iv, input, Some(&mut output))?;
        output.truncate(written);
        Ok(output)
    }

    /// Decrypts a complete message in a single call.
    ///
    /// There is no IV parameter: for modes that take one, the IV is carried
    /// at the front of `input` (the framing the provider interface uses for
    /// its one-shot decrypt entry point). ECB input is ciphertext as-is.
    ///
    /// # Arguments
    ///
    /// * `attributes` - Attributes stored with the key; must permit decryption
    /// * `key` - Raw AES key bytes (16, 24, or 32)
    /// * `alg` - Cipher mode to apply
    /// * `input` - IV (when the mode takes one) followed by ciphertext
    /// * `output` - Optional output buffer. If `None`, returns the output
    ///   size to provision (for padded modes an upper bound; the final
    ///   length is known only after padding removal).
    ///
    /// # Errors
    ///
    /// - `CipherError::InvalidArgument` - Input is shorter than the IV or
    ///   violates the mode's block alignment
    /// - `CipherError::InvalidPadding` - Padding failed validation
    /// - `CipherError::BufferTooSmall` - `output` is smaller than the
    ///   provisioning bound; nothing is written
    /// - `CipherError::NotPermitted` - The key's usage flags do not allow
    ///   decryption
    pub fn decrypt(
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
        input: &[u8],
        output: Option<&mut [u8]>,
    ) -> Result<usize, CipherError> {
        let iv_len = alg.iv_size().unwrap_or(0);
        if input.len() < iv_len {
            return Err(CipherError::InvalidArgument);
        }
        let (iv, body) = input.split_at(iv_len);

        let bound = Self::decrypt_output_bound(alg, body.len())?;
        let Some(output) = output else {
            return Ok(bound);
        };
        if output.len() < bound {
            return Err(CipherError::BufferTooSmall);
        }

        let mut op = CipherOperation::decrypt_setup(attributes, key, alg)?;
        match Self::run_decrypt(&mut op, iv, body, output) {
            Ok(count) => Ok(count),
            Err(err) => {
                let _ = op.abort();
                Err(err)
            }
        }
    }

    /// Decrypts a complete message and returns the result as a new vector.
    pub fn decrypt_vec(
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
        input: &[u8],
    ) -> Result<Vec<u8>, CipherError> {
        let bound = Self::decrypt(attributes, key, alg, input, None)?;
        let mut output = vec![0u8; bound];
        let written = Self::decrypt(attributes, key, alg, input, Some(&mut output))?;
        output.truncate(written);
        Ok(output)
    }

    /// Exact output length of a one-shot encryption, validating alignment.
    fn encrypt_output_len(alg: CipherAlg, input_len: usize) -> Result<usize, CipherError> {
        match alg {
            CipherAlg::EcbNoPadding | CipherAlg::CbcNoPadding => {
                if !input_len.is_multiple_of(AES_BLOCK_SIZE) {
                    return Err(CipherError::InvalidArgument);
                }
                Ok(input_len)
            }
            // padding always adds: a full block when the input is aligned
            CipherAlg::CbcPkcs7 => Ok((input_len / AES_BLOCK_SIZE + 1) * AES_BLOCK_SIZE),
            CipherAlg::Ctr => Ok(input_len),
        }
    }

    /// Output bound of a one-shot decryption, validating alignment.
    fn decrypt_output_bound(alg: CipherAlg, body_len: usize) -> Result<usize, CipherError> {
        match alg {
            CipherAlg::EcbNoPadding | CipherAlg::CbcNoPadding => {
                if !body_len.is_multiple_of(AES_BLOCK_SIZE) {
                    return Err(CipherError::InvalidArgument);
                }
                Ok(body_len)
            }
            CipherAlg::CbcPkcs7 => {
                if body_len == 0 || !body_len.is_multiple_of(AES_BLOCK_SIZE) {
                    return Err(CipherError::InvalidArgument);
                }
                Ok(body_len)
            }
            CipherAlg::Ctr => Ok(body_len),
        }
    }

    fn run_encrypt(
        op: &mut CipherOperation,
        iv: Option<&[u8]>,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, CipherError> {
        match (iv, op.algorithm().iv_size()) {
            (Some(iv), Some(_)) => op.set_iv(iv)?,
            (None, None) => {}
            // IV presence must agree with the mode
            (Some(_), None) | (None, Some(_)) => return Err(CipherError::InvalidArgument),
        }
        let count = op.update(input, Some(output))?;
        Ok(count + op.finish(Some(&mut output[count..]))?)
    }

    fn run_decrypt(
        op: &mut CipherOperation,
        iv: &[u8],
        body: &[u8],
        output: &mut [u8],
    ) -> Result<usize, CipherError> {
        if !iv.is_empty() {
            op.set_iv(iv)?;
        }
        let count = op.update(body, Some(output))?;
        Ok(count + op.finish(Some(&mut output[count..]))?)
    }
}

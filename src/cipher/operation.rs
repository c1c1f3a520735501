// Copyright (C) Microsoft Corporation. All rights reserved.

//! Multipart cipher operation state machine.
//!
//! A [`CipherOperation`] is created by one of the setup constructors and then
//! driven through `set_iv` (when the mode takes one), any number of `update`
//! calls, and a single `finish`. `abort` releases the operation from any
//! state. Phases only ever move forward; a finished or aborted operation
//! accepts no further calls and a fresh setup is required to start over.
//!
//! Key material is copied at setup and wiped on finish, on abort, and on
//! drop, along with any buffered message bytes and chaining state.

use zeroize::Zeroize;

use super::*;

/// Lifecycle phase of a cipher operation.
///
/// Setup returns an owned operation, so there is no uninitialized phase;
/// `SetupDone` exists only for modes that require an IV (IV-less modes go
/// straight to `Active`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    SetupDone,
    Active,
    Finished,
    Aborted,
}

/// One in-flight multipart cipher session.
///
/// The operation owns its key material, pending sub-block bytes, and the
/// chaining state for CBC (running IV) and CTR (counter). The block
/// transform is invoked only with whole blocks plus an explicit chain value,
/// so transforms hold no per-operation state of their own.
///
/// # Lifecycle
///
/// 1. [`encrypt_setup`](Self::encrypt_setup) or
///    [`decrypt_setup`](Self::decrypt_setup)
/// 2. [`set_iv`](Self::set_iv) for modes with an IV
/// 3. [`update`](Self::update), any number of times
/// 4. [`finish`](Self::finish), or [`abort`](Self::abort) at any point
///
/// # Thread Safety
///
/// All mutating calls take `&mut self`; a single operation cannot be driven
/// from two threads at once without external synchronization.
pub struct CipherOperation<T: BlockTransform = AesTransform> {
    transform: T,
    alg: CipherAlg,
    direction: Direction,
    key: KeyMaterial,
    chain: [u8; AES_BLOCK_SIZE],
    pending: BlockBuffer,
    phase: Phase,
}

impl CipherOperation<AesTransform> {
    /// Sets up a multipart encryption operation using the platform block
    /// transform.
    ///
    /// The caller's key buffer is copied and need not outlive this call.
    ///
    /// # Errors
    ///
    /// - `CipherError::NotPermitted` - The key's usage flags do not allow
    ///   encryption
    /// - `CipherError::InvalidArgument` - The key size is not 16, 24, or 32
    ///   bytes
    pub fn encrypt_setup(
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
    ) -> Result<Self, CipherError> {
        Self::encrypt_setup_with(AesTransform::default(), attributes, key, alg)
    }

    /// Sets up a multipart decryption operation using the platform block
    /// transform.
    ///
    /// # Errors
    ///
    /// - `CipherError::NotPermitted` - The key's usage flags do not allow
    ///   decryption
    /// - `CipherError::InvalidArgument` - The key size is not 16, 24, or 32
    ///   bytes
    pub fn decrypt_setup(
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
    ) -> Result<Self, CipherError> {
        Self::decrypt_setup_with(AesTransform::default(), attributes, key, alg)
    }
}

impl<T: BlockTransform> CipherOperation<T> {
    /// Sets up a multipart encryption operation over a caller-supplied block
    /// transform.
    pub fn encrypt_setup_with(
        transform: T,
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
    ) -> Result<Self, CipherError> {
        Self::setup(transform, attributes, key, alg, Direction::Encrypt)
    }

    /// Sets up a multipart decryption operation over a caller-supplied block
    /// transform.
    pub fn decrypt_setup_with(
        transform: T,
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
    ) -> Result<Self, CipherError> {
        Self::setup(transform, attributes, key, alg, Direction::Decrypt)
    }

    fn setup(
        transform: T,
        attributes: &KeyAttributes,
        key: &[u8],
        alg: CipherAlg,
        direction: Direction,
    ) -> Result<Self, CipherError> {
        if !attributes.usage().allows(direction) {
            return Err(CipherError::NotPermitted);
        }
        alg.validate_key_size(key.len())?;

        // padded decryption must hold the final ciphertext block back from
        // update so finish can validate and strip the padding
        let hold_back = alg.padded() && direction == Direction::Decrypt;
        let phase = if alg.iv_size().is_some() {
            Phase::SetupDone
        } else {
            Phase::Active
        };

        Ok(Self {
            transform,
            alg,
            direction,
            key: KeyMaterial::new(key),
            chain: [0u8; AES_BLOCK_SIZE],
            pending: BlockBuffer::new(hold_back),
            phase,
        })
    }

    /// Returns the cipher mode bound at setup.
    pub fn algorithm(&self) -> CipherAlg {
        self.alg
    }

    /// Returns the direction bound at setup.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Sets the IV, nonce, or initial counter value for the operation.
    ///
    /// Valid exactly once, before the first `update`, and only for modes
    /// that take an IV.
    ///
    /// # Errors
    ///
    /// - `CipherError::InvalidArgument` - The IV length does not match the
    ///   mode's requirement, or the mode takes no IV
    /// - `CipherError::BadState` - The IV was already set, or the operation
    ///   is finished or aborted
    pub fn set_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        match self.phase {
            Phase::SetupDone => {}
            // IV-less modes are Active from setup and have no IV slot to fill
            Phase::Active if self.alg.iv_size().is_none() => {
                return Err(CipherError::InvalidArgument)
            }
            _ => return Err(CipherError::BadState),
        }

        let Some(required) = self.alg.iv_size() else {
            return Err(CipherError::InvalidArgument);
        };
        if iv.len() != required {
            return Err(CipherError::InvalidArgument);
        }

        self.chain.copy_from_slice(iv);
        self.phase = Phase::Active;
        Ok(())
    }

    /// Processes a message fragment.
    ///
    /// Input is appended to the pending buffer and every complete block now
    /// available is transformed into `output`; a sub-block tail stays
    /// buffered for the next call. The emitted length is therefore a whole
    /// number of blocks and legitimately zero when the fragment does not
    /// complete one.
    ///
    /// # Arguments
    ///
    /// * `input` - Message fragment to encrypt or decrypt
    /// * `output` - Optional output buffer. If `None`, returns the number of
    ///   bytes this call would emit without processing anything.
    ///
    /// # Errors
    ///
    /// - `CipherError::BadState` - The operation is not active (IV not yet
    ///   set, finished, or aborted); `output` is untouched
    /// - `CipherError::BufferTooSmall` - `output` cannot hold the blocks
    ///   this call must emit; nothing is written and nothing is consumed
    /// - `CipherError::CommunicationFailure` / `CipherError::HardwareFailure`
    ///   - The block transform failed; discard the operation via `abort`
    /// - `CipherError::CorruptionDetected` - Internal invariant violation;
    ///   the operation is unusable
    pub fn update(
        &mut self,
        input: &[u8],
        output: Option<&mut [u8]>,
    ) -> Result<usize, CipherError> {
        match self.phase {
            Phase::Active => {}
            _ => return Err(CipherError::BadState),
        }
        self.check_pending()?;

        let emit = self.pending.update_len(input);
        let Some(output) = output else {
            return Ok(emit);
        };
        if output.len() < emit {
            return Err(CipherError::BufferTooSmall);
        }

        let Self {
            transform,
            key,
            chain,
            pending,
            alg,
            direction,
            ..
        } = self;

        let mut offset = 0;
        let count = pending.update(input, |run| {
            let chain_copy = *chain;
            let req = TransformRequest {
                key: key.bytes(),
                alg: *alg,
                direction: *direction,
                chain: alg.iv_size().map(|_| &chain_copy),
                input: run,
            };
            transform.transform(&req, &mut output[offset..offset + run.len()])?;

            match alg {
                CipherAlg::EcbNoPadding => {}
                CipherAlg::CbcNoPadding | CipherAlg::CbcPkcs7 => {
                    // the running IV is the last ciphertext block of the run
                    let last = if *direction == Direction::Encrypt {
                        &output[offset + run.len() - AES_BLOCK_SIZE..offset + run.len()]
                    } else {
                        &run[run.len() - AES_BLOCK_SIZE..]
                    };
                    chain.copy_from_slice(last);
                }
                CipherAlg::Ctr => ctr_add(chain, (run.len() / AES_BLOCK_SIZE) as u64),
            }

            offset += run.len();
            Ok(())
        })?;

        debug_assert!(count == emit);
        Ok(count)
    }

    /// Finishes the operation, flushing or validating any pending bytes.
    ///
    /// Block-aligned modes require the pending buffer to be empty. Padded
    /// encryption emits the final padding block; padded decryption validates
    /// and strips the padding from the held-back block. CTR flushes the
    /// sub-block remainder.
    ///
    /// On success, and on every failure except `BufferTooSmall`, the
    /// operation transitions to finished and its key material is wiped.
    /// After `BufferTooSmall` the operation stays active so the call can be
    /// retried with a larger buffer.
    ///
    /// # Arguments
    ///
    /// * `output` - Optional output buffer. If `None`, returns the output
    ///   size to provision for this call (for padded decryption this is an
    ///   upper bound; the final length is known only after padding removal).
    ///
    /// # Errors
    ///
    /// - `CipherError::BadState` - The operation is not active
    /// - `CipherError::InvalidArgument` - Total input violates the mode's
    ///   block alignment requirement
    /// - `CipherError::InvalidPadding` - Decrypted padding failed validation
    /// - `CipherError::BufferTooSmall` - `output` cannot hold the final
    ///   bytes; nothing is written and the operation stays active
    /// - `CipherError::CommunicationFailure` / `CipherError::HardwareFailure`
    ///   - The block transform failed
    pub fn finish(&mut self, output: Option<&mut [u8]>) -> Result<usize, CipherError> {
        match self.phase {
            Phase::Active => {}
            _ => return Err(CipherError::BadState),
        }
        self.check_pending()?;

        let pending_len = self.pending.len();
        let required = match self.alg {
            _ if self.alg.padded() => AES_BLOCK_SIZE,
            CipherAlg::Ctr => pending_len,
            _ => 0,
        };
        let Some(output) = output else {
            return Ok(required);
        };

        if self.alg.needs_alignment() {
            let result = if pending_len == 0 {
                Ok(0)
            } else {
                Err(CipherError::InvalidArgument)
            };
            self.conclude();
            return result;
        }

        if self.alg == CipherAlg::Ctr {
            if output.len() < pending_len {
                return Err(CipherError::BufferTooSmall);
            }
            if pending_len > 0 {
                let mut scratch = [0u8; AES_BLOCK_SIZE];
                let chain_copy = self.chain;
                let req = TransformRequest {
                    key: self.key.bytes(),
                    alg: self.alg,
                    direction: self.direction,
                    chain: Some(&chain_copy),
                    input: self.pending.pending(),
                };
                if let Err(err) = self.transform.transform(&req, &mut scratch[..pending_len]) {
                    scratch.zeroize();
                    self.conclude();
                    return Err(err.into());
                }
                output[..pending_len].copy_from_slice(&scratch[..pending_len]);
                scratch.zeroize();
            }
            self.conclude();
            return Ok(pending_len);
        }

        match self.direction {
            Direction::Encrypt => self.finish_pad_encrypt(output),
            Direction::Decrypt => self.finish_pad_decrypt(output),
        }
    }

    /// Emits the final PKCS#7-padded block of a padded encryption.
    fn finish_pad_encrypt(&mut self, output: &mut [u8]) -> Result<usize, CipherError> {
        if output.len() < AES_BLOCK_SIZE {
            return Err(CipherError::BufferTooSmall);
        }

        let pending_len = self.pending.len();
        let pad = (AES_BLOCK_SIZE - pending_len) as u8;
        let mut block = [pad; AES_BLOCK_SIZE];
        block[..pending_len].copy_from_slice(self.pending.pending());

        let mut scratch = [0u8; AES_BLOCK_SIZE];
        let chain_copy = self.chain;
        let req = TransformRequest {
            key: self.key.bytes(),
            alg: self.alg,
            direction: self.direction,
            chain: Some(&chain_copy),
            input: &block,
        };
        let result = self.transform.transform(&req, &mut scratch);
        block.zeroize();
        if let Err(err) = result {
            scratch.zeroize();
            self.conclude();
            return Err(err.into());
        }

        output[..AES_BLOCK_SIZE].copy_from_slice(&scratch);
        scratch.zeroize();
        self.conclude();
        Ok(AES_BLOCK_SIZE)
    }

    /// Validates and strips the padding of the held-back final block of a
    /// padded decryption.
    fn finish_pad_decrypt(&mut self, output: &mut [u8]) -> Result<usize, CipherError> {
        if self.pending.len() != AES_BLOCK_SIZE {
            // ciphertext was not a whole number of blocks
            self.conclude();
            return Err(CipherError::InvalidArgument);
        }

        let mut scratch = [0u8; AES_BLOCK_SIZE];
        let chain_copy = self.chain;
        let req = TransformRequest {
            key: self.key.bytes(),
            alg: self.alg,
            direction: self.direction,
            chain: Some(&chain_copy),
            input: self.pending.pending(),
        };
        if let Err(err) = self.transform.transform(&req, &mut scratch) {
            scratch.zeroize();
            self.conclude();
            return Err(err.into());
        }

        let unpadded = match strip_pkcs7(&scratch) {
            Ok(unpadded) => unpadded,
            Err(err) => {
                scratch.zeroize();
                self.conclude();
                return Err(err);
            }
        };

        if output.len() < unpadded {
            // retryable: the held block and chain are untouched
            scratch.zeroize();
            return Err(CipherError::BufferTooSmall);
        }

        output[..unpadded].copy_from_slice(&scratch[..unpadded]);
        scratch.zeroize();
        self.conclude();
        Ok(unpadded)
    }

    /// Aborts the operation from any phase.
    ///
    /// Wipes key material, buffered message bytes, and chaining state, then
    /// marks the operation aborted. Idempotent: aborting an already finished
    /// or aborted operation succeeds and leaves everything wiped.
    pub fn abort(&mut self) -> Result<(), CipherError> {
        self.key.wipe();
        self.pending.clear();
        self.chain.zeroize();
        self.phase = Phase::Aborted;
        Ok(())
    }

    /// Wipes sensitive state and marks the operation finished.
    fn conclude(&mut self) {
        self.key.wipe();
        self.pending.clear();
        self.chain.zeroize();
        self.phase = Phase::Finished;
    }

    /// Pending length at rest must stay under the buffer's bound; anything
    /// else is internal corruption and must not be masked.
    fn check_pending(&self) -> Result<(), CipherError> {
        if self.pending.len() > self.pending.rest_bound() {
            return Err(CipherError::CorruptionDetected);
        }
        Ok(())
    }
}

/// Advances a big-endian CTR counter by `blocks`, wrapping modulo 2^128.
fn ctr_add(counter: &mut [u8; AES_BLOCK_SIZE], mut blocks: u64) {
    for byte in counter.iter_mut().rev() {
        if blocks == 0 {
            break;
        }
        let sum = *byte as u64 + (blocks & 0xff);
        *byte = sum as u8;
        blocks = (blocks >> 8) + (sum >> 8);
    }
}

/// Validates a decrypted PKCS#7 final block and returns the unpadded length.
fn strip_pkcs7(block: &[u8; AES_BLOCK_SIZE]) -> Result<usize, CipherError> {
    let pad = block[AES_BLOCK_SIZE - 1] as usize;
    if pad == 0 || pad > AES_BLOCK_SIZE {
        return Err(CipherError::InvalidPadding);
    }
    if block[AES_BLOCK_SIZE - pad..].iter().any(|&b| b as usize != pad) {
        return Err(CipherError::InvalidPadding);
    }
    Ok(AES_BLOCK_SIZE - pad)
}

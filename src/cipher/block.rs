// Copyright (C) Microsoft Corporation. All rights reserved.

//! Pending-block buffering for multipart operations.
//!
//! AES operates on fixed 16-byte blocks, but multipart callers deliver input
//! in arbitrary fragments. This buffer accumulates the sub-block tail between
//! update calls and hands complete runs to the caller's block operation.
//!
//! For padded decryption the final ciphertext block must not be emitted from
//! `update` at all — padding is validated and stripped at finish — so the
//! buffer can be configured to keep one complete block resident whenever the
//! data consumed so far ends on a block boundary.

use zeroize::Zeroize;

use super::*;

/// Block accumulator for one multipart operation.
///
/// At rest the buffered length is strictly less than one block, except in
/// hold-back mode where it may be exactly one block. Buffered bytes are
/// message plaintext or ciphertext and are zeroed on clear and on drop.
pub(crate) struct BlockBuffer {
    buf: Vec<u8>,
    hold_back: bool,
}

impl BlockBuffer {
    pub(crate) fn new(hold_back: bool) -> Self {
        Self {
            buf: Vec::with_capacity(AES_BLOCK_SIZE),
            hold_back,
        }
    }

    /// Bytes currently buffered.
    pub(crate) fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Largest buffered length this configuration permits at rest.
    pub(crate) fn rest_bound(&self) -> usize {
        if self.hold_back {
            AES_BLOCK_SIZE
        } else {
            AES_BLOCK_SIZE - 1
        }
    }

    /// Number of bytes `update` would emit for this input, without
    /// processing anything.
    pub(crate) fn update_len(&self, input: &[u8]) -> usize {
        let total = self.buf.len() + input.len();
        total - self.keep_len(total)
    }

    /// Length left buffered after consuming `total` bytes overall.
    fn keep_len(&self, total: usize) -> usize {
        let tail = total % AES_BLOCK_SIZE;
        if self.hold_back && tail == 0 && total > 0 {
            AES_BLOCK_SIZE
        } else {
            tail
        }
    }

    /// Consumes `input`, invoking `op` on each contiguous run of complete
    /// blocks ready for processing and buffering the remainder.
    ///
    /// `op` receives whole-block runs only: first the resident block once
    /// input completes it, then the aligned span of the remaining input. It
    /// must process the run fully or fail; on failure the buffer state is
    /// unspecified and the operation is expected to discard it.
    ///
    /// Returns the number of bytes handed to `op`, which always equals
    /// [`Self::update_len`] for the same input.
    pub(crate) fn update<F>(&mut self, input: &[u8], mut op: F) -> Result<usize, CipherError>
    where
        F: FnMut(&[u8]) -> Result<(), CipherError>,
    {
        let emit = self.update_len(input);
        let mut consumed = 0;
        let mut count = 0;

        // complete and flush the resident block first
        if !self.buf.is_empty() && emit > 0 {
            let fill = AES_BLOCK_SIZE - self.buf.len();
            self.buf.extend_from_slice(&input[..fill]);
            consumed = fill;
            op(&self.buf)?;
            count = AES_BLOCK_SIZE;
            self.buf.zeroize();
        }

        let body = emit - count;
        if body > 0 {
            op(&input[consumed..consumed + body])?;
            consumed += body;
            count += body;
        }

        self.buf.extend_from_slice(&input[consumed..]);
        Ok(count)
    }

    /// Zeroes and discards any buffered bytes.
    pub(crate) fn clear(&mut self) {
        self.buf.zeroize();
    }
}

impl Drop for BlockBuffer {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

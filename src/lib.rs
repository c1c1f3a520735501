// Copyright (C) Microsoft Corporation. All rights reserved.

//! Multipart AES cipher operation engine.
//!
//! This crate implements the symmetric cipher portion of a cryptographic
//! provider: an operation engine that validates caller input, drives an
//! underlying AES block-transform backend, and tracks operation state across
//! fragmented (multipart) calls. It includes support for:
//!
//! - **Multipart operations**: setup, optional IV, any number of updates,
//!   finish, with abort available from every state
//! - **One-shot operations**: encrypt/decrypt a complete message in one call
//! - **Modes**: AES-ECB, AES-CBC (with and without PKCS#7 padding), AES-CTR
//! - **Key sizes**: AES-128, AES-192, and AES-256
//!
//! # Division of Responsibility
//!
//! The engine owns input validation, block buffering, padding, and chaining
//! state. It does not own key lifecycle, algorithm selection policy, or IV
//! generation — those belong to the calling provider core — and it treats the
//! AES block transform itself as an opaque capability behind the
//! [`BlockTransform`] trait.
//!
//! # Buffer Management
//!
//! Output buffers are caller-allocated. All operations accept
//! `Option<&mut [u8]>`:
//! - Pass `None` to query the output size for the call
//! - Pass `Some(buffer)` to perform the actual operation
//!
//! A call that would overflow the provided buffer fails with
//! [`CipherError::BufferTooSmall`] and writes nothing.
//!
//! # Thread Safety
//!
//! A [`CipherOperation`] requires `&mut self` for every state transition, so
//! the borrow checker serializes access. Independent operations may run
//! concurrently on separate threads.

mod alg;
mod cipher;
mod key;
mod transform;

pub use alg::*;
pub use cipher::*;
pub use key::*;
use thiserror::Error;
pub use transform::*;

/// Error type for all cipher engine operations.
///
/// Mirrors the status-code contract of a provider driver interface: every
/// entry point returns `Result<_, CipherError>` and no error is ever raised
/// by panicking. Some variants (`InsufficientMemory`, `StorageFailure`,
/// `InvalidHandle`) are produced by collaborators that share this contract
/// rather than by the engine itself.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherError {
    /// The requested algorithm is not a supported cipher mode.
    #[error("algorithm not supported")]
    NotSupported,
    /// A parameter is invalid for the requested operation, such as a key or
    /// IV of the wrong size, or input that violates block alignment.
    #[error("invalid argument")]
    InvalidArgument,
    /// Decryption produced padding that fails validation.
    #[error("invalid padding")]
    InvalidPadding,
    /// The output buffer cannot hold the bytes this call must emit.
    #[error("output buffer too small")]
    BufferTooSmall,
    /// A collaborator could not allocate required memory.
    #[error("insufficient memory")]
    InsufficientMemory,
    /// The operation is not in a state that permits this call.
    #[error("operation state does not permit this call")]
    BadState,
    /// Transport to the block-transform backend failed.
    #[error("communication with the cipher backend failed")]
    CommunicationFailure,
    /// The block-transform backend reported an internal failure.
    #[error("cipher backend failure")]
    HardwareFailure,
    /// An internal invariant was violated; the operation must be discarded.
    #[error("internal state corruption detected")]
    CorruptionDetected,
    /// A collaborator's persistent storage failed.
    #[error("storage failure")]
    StorageFailure,
    /// A key handle does not refer to a live key.
    #[error("invalid key handle")]
    InvalidHandle,
    /// The key's usage policy does not permit the requested direction.
    #[error("key usage does not permit this operation")]
    NotPermitted,
}

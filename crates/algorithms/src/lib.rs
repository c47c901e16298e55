//! Block cipher primitives with constant-time implementation
//!
//! This crate provides the pure Rust building blocks behind the cryptsel
//! software backend: the AES block cipher (128, 192 and 256-bit keys) and
//! the ECB and CBC chaining modes applied to whole-block buffers.
//!
//! Nothing here knows about padding or streaming; callers hand in block
//! aligned data and get block aligned data back.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

// Error module and re-exports
pub mod error;
pub use error::{validate, Error, Result};

// Block cipher implementations
pub mod block;
pub use block::{Aes, BlockCipher, Cbc, Ecb};

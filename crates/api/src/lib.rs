//! Public API traits and types for cryptsel
//!
//! This crate provides the public API surface shared by every cryptsel
//! component: the error taxonomy, the identifiers used to name algorithms,
//! modes and backends, and the raw block cipher boundary that every backend
//! (kernel device, offload engine, native library, software) implements.

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate level for convenience
pub use error::{validate, Error, Result};
pub use traits::{RawBlockCipher, RawSession, PROBE_KEY};
pub use types::*;

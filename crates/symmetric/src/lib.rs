//! Streaming block transforms over interchangeable raw cipher backends
//!
//! This crate is the core of cryptsel:
//!
//! - [`transform`]: the streaming state machine, the chunked I/O driver and
//!   the ownership of backend sessions;
//! - [`padding`]: the padding engine for the final block;
//! - [`selector`]: the backend registry with its memoized capability probes;
//! - [`backend`]: the backends shipped here (software, and OpenSSL behind the
//!   `openssl` feature).

#![forbid(unsafe_code)]

pub mod backend;
pub mod padding;
pub mod selector;
pub mod transform;

pub use backend::SoftwareBackend;
#[cfg(feature = "openssl")]
pub use backend::OpenSslBackend;
pub use selector::{
    AvailabilityCache, BackendCandidate, Registry, RegistryBuilder, Resolution, SelectorConfig,
};
pub use transform::{BlockTransform, TransformParams, TransformState};

// Re-export the API error system and identifiers
pub use api::error::{validate, Error, Result};
pub use api::{
    AlgorithmId, BackendKind, BlockAlgorithm, CipherMode, Direction, NativeCode, PaddingMode,
    RawBlockCipher, RawSession,
};

//! # cryptsel
//!
//! Streaming CBC/ECB block transforms with padding, served by whichever raw
//! block cipher backend works on the running machine.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cryptsel = "0.4"
//! ```
//!
//! ```
//! use cryptsel::prelude::*;
//!
//! let key = [0x2Bu8; 16];
//! let iv = [0u8; 16];
//! let registry = Registry::default();
//! let params = TransformParams::new(BlockAlgorithm::Aes, &key).iv(&iv);
//!
//! let mut enc = registry.encryptor(&params)?;
//! let mut ciphertext = enc.update(&[7u8; 32])?;
//! ciphertext.extend(enc.finalize(b"tail")?);
//!
//! let plaintext = registry.decryptor(&params)?.finalize(&ciphertext)?;
//! assert_eq!(&plaintext[32..], b"tail");
//! # Ok::<(), cryptsel::api::Error>(())
//! ```
//!
//! ## Features
//!
//! - `openssl`: native library backend on the system OpenSSL
//! - `serde`: serializable identifiers and selector configuration
//! - `full`: all features enabled
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports functionality from several sub-crates:
//!
//! - [`api`]: errors, identifiers and the raw backend traits
//! - [`common`]: zeroizing secret containers
//! - [`algorithms`]: the pure Rust AES, ECB and CBC primitives
//! - [`symmetric`]: transforms, padding, backends and the selector

#![forbid(unsafe_code)]

pub use cryptsel_algorithms as algorithms;
pub use cryptsel_api as api;
pub use cryptsel_common as common;
pub use cryptsel_symmetric as symmetric;

/// Common imports for cryptsel users
pub mod prelude {
    // Re-export error types
    pub use crate::api::{Error, Result};

    // Identifiers
    pub use crate::api::{
        AlgorithmId, BackendKind, BlockAlgorithm, CipherMode, Direction, PaddingMode,
    };

    // Backend boundary
    pub use crate::api::{RawBlockCipher, RawSession};

    // Transforms and selection
    pub use crate::symmetric::{
        BackendCandidate, BlockTransform, Registry, RegistryBuilder, SelectorConfig,
        SoftwareBackend, TransformParams, TransformState,
    };

    #[cfg(feature = "openssl")]
    pub use crate::symmetric::OpenSslBackend;

    pub use zeroize::Zeroize;
}

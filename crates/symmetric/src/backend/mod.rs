//! Raw block cipher backends shipped with cryptsel
//!
//! Kernel device and offload backends live with their integrators and are
//! plugged in through [`api::RawBlockCipher`]. This module provides the
//! always-available software fallback and, behind the `openssl` feature, a
//! native library backend.

pub mod software;
#[cfg(feature = "openssl")]
pub mod openssl;

pub use software::SoftwareBackend;
#[cfg(feature = "openssl")]
pub use self::openssl::OpenSslBackend;

//! Common implementations and shared functionality for cryptsel
//!
//! Secret containers that zeroize on drop, used for key schedules, key
//! copies held by backends and decrypted intermediate buffers.

#![forbid(unsafe_code)]

pub mod security;

// Re-export core security types
pub use security::{SecretBuffer, SecretVec};

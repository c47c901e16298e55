//! Constant values for cryptsel cryptographic operations

pub mod symmetric;

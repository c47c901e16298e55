//! Constant values for cryptsel
//!
//! Sizes and limits shared by the software primitives, the backend boundary
//! and the transform engine.

#![no_std]

pub mod utils;

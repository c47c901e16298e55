//! Internal utilities for cryptsel
//!
//! Not part of the public API; shared by the software primitives and the
//! padding engine.

#![no_std]
#![forbid(unsafe_code)]

pub mod constant_time;

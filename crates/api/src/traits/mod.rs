//! Trait definitions for the raw block cipher boundary

pub mod backend;

pub use backend::{RawBlockCipher, RawSession, PROBE_KEY};

//! Block cipher modes of operation
//!
//! Both modes work in place on block-aligned buffers and never pad.

pub mod cbc;
pub mod ecb;

// Re-exports
pub use cbc::Cbc;
pub use ecb::Ecb;

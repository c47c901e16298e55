//! Block ciphers and their modes of operation

pub mod aes;
pub mod modes;

pub use aes::Aes;
pub use modes::{Cbc, Ecb};

use crate::error::Result;

/// A keyed block cipher permuting one block at a time
pub trait BlockCipher {
    /// Block size in bytes
    const BLOCK_SIZE: usize;

    /// Human readable name, including the key size
    fn name(&self) -> &'static str;

    /// Encrypt a single block in place
    fn encrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Decrypt a single block in place
    fn decrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Block size of this cipher
    fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }
}

//! Electronic Codebook (ECB) mode
//!
//! Every block is transformed independently with the same key, so equal
//! plaintext blocks give equal ciphertext blocks.

use super::super::BlockCipher;
use crate::error::{validate, Result};

/// ECB mode over a borrowed cipher
pub struct Ecb<'a, B: BlockCipher> {
    cipher: &'a B,
}

impl<'a, B: BlockCipher> Ecb<'a, B> {
    /// Wrap a keyed cipher
    pub fn new(cipher: &'a B) -> Self {
        Self { cipher }
    }

    /// Encrypt a block-aligned buffer in place
    pub fn encrypt_in_place(&self, data: &mut [u8]) -> Result<()> {
        validate::block_multiple("ECB plaintext", data.len(), B::BLOCK_SIZE)?;
        for block in data.chunks_exact_mut(B::BLOCK_SIZE) {
            self.cipher.encrypt_block(block)?;
        }
        Ok(())
    }

    /// Decrypt a block-aligned buffer in place
    pub fn decrypt_in_place(&self, data: &mut [u8]) -> Result<()> {
        validate::block_multiple("ECB ciphertext", data.len(), B::BLOCK_SIZE)?;
        for block in data.chunks_exact_mut(B::BLOCK_SIZE) {
            self.cipher.decrypt_block(block)?;
        }
        Ok(())
    }
}

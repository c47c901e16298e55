//! Cipher Block Chaining (CBC) mode implementation
//!
//! CBC mode XORs each plaintext block with the previous ciphertext block
//! before encryption. The first block is XORed with an initialization
//! vector (IV).
//!
//! The running chain value is kept in the [`Cbc`] instance, so a message may
//! be processed over several calls. [`Cbc::iv`] exposes the current chain
//! value for callers that hand it to another engine between calls.
//!
//! This implementation follows NIST SP 800-38A.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::super::BlockCipher;
use crate::error::{validate, Result};
use internal::constant_time::ct_xor_into;
use params::utils::symmetric::MAX_BLOCK_SIZE;

/// CBC mode over a borrowed cipher
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Cbc<'a, B: BlockCipher> {
    #[zeroize(skip)]
    cipher: &'a B,
    chain: [u8; MAX_BLOCK_SIZE],
}

impl<'a, B: BlockCipher> Cbc<'a, B> {
    /// Creates a new CBC mode instance with the given cipher and IV
    ///
    /// The IV must be exactly one block long.
    pub fn new(cipher: &'a B, iv: &[u8]) -> Result<Self> {
        validate::length("CBC initialization vector", iv.len(), B::BLOCK_SIZE)?;
        validate::parameter(
            B::BLOCK_SIZE <= MAX_BLOCK_SIZE,
            "block size",
            "larger than the supported maximum",
        )?;

        let mut chain = [0u8; MAX_BLOCK_SIZE];
        chain[..B::BLOCK_SIZE].copy_from_slice(iv);
        Ok(Self { cipher, chain })
    }

    /// Current chain value: the IV before the first call, afterwards the
    /// last ciphertext block processed
    pub fn iv(&self) -> &[u8] {
        &self.chain[..B::BLOCK_SIZE]
    }

    /// Encrypts a block-aligned buffer in place
    pub fn encrypt_in_place(&mut self, data: &mut [u8]) -> Result<()> {
        let bs = B::BLOCK_SIZE;
        validate::block_multiple("CBC plaintext", data.len(), bs)?;

        for block in data.chunks_exact_mut(bs) {
            ct_xor_into(block, &self.chain[..bs]);
            self.cipher.encrypt_block(block)?;
            self.chain[..bs].copy_from_slice(block);
        }
        Ok(())
    }

    /// Decrypts a block-aligned buffer in place
    pub fn decrypt_in_place(&mut self, data: &mut [u8]) -> Result<()> {
        let bs = B::BLOCK_SIZE;
        validate::block_multiple("CBC ciphertext", data.len(), bs)?;

        let mut saved = [0u8; MAX_BLOCK_SIZE];
        for block in data.chunks_exact_mut(bs) {
            saved[..bs].copy_from_slice(block);
            self.cipher.decrypt_block(block)?;
            ct_xor_into(block, &self.chain[..bs]);
            self.chain[..bs].copy_from_slice(&saved[..bs]);
        }
        saved.zeroize();
        Ok(())
    }

    /// Encrypts a message, returning the ciphertext
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = plaintext.to_vec();
        self.encrypt_in_place(&mut out)?;
        Ok(out)
    }

    /// Decrypts a message, returning the plaintext
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut out = ciphertext.to_vec();
        self.decrypt_in_place(&mut out)?;
        Ok(out)
    }
}

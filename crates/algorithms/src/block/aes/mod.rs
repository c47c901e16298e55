//! AES block cipher
//!
//! This module implements the Advanced Encryption Standard (AES) block cipher
//! as specified in FIPS 197, for 128, 192 and 256-bit keys. The key length
//! picks the number of rounds; a single [`Aes`] type serves all three.
//!
//! ## Constant-Time Guarantees
//!
//! This implementation mitigates timing side-channel attacks by:
//! - Using branchless arithmetic for GF(2^8) operations
//! - Using bitsliced S-box implementations instead of table lookups
//! - Touching every round key byte before each block
//!
//! Kernel and library backends are preferred whenever they are available;
//! this implementation is the fallback of last resort.

use std::sync::atomic::{compiler_fence, Ordering};

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::BlockCipher;
use crate::error::{validate, Error, Result};
use common::security::SecretBuffer;
use params::utils::symmetric::{
    AES128_KEY_SIZE, AES192_KEY_SIZE, AES256_KEY_SIZE, AES_BLOCK_SIZE,
};

/// Round constants for AES key expansion
const RCON: [u32; 11] = [
    0x00000000, 0x01000000, 0x02000000, 0x04000000, 0x08000000, 0x10000000, 0x20000000,
    0x40000000, 0x80000000, 0x1b000000, 0x36000000,
];

/// Room for the largest schedule: 15 round keys of 16 bytes (AES-256)
const MAX_SCHEDULE: usize = 240;

/// Multiply two bytes in GF(2⁸) with AES's reduction poly x⁸ + x⁴ + x³ + x + 1
#[inline(always)]
fn gf_mul(a: u8, b: u8) -> u8 {
    let mut p = 0u8;
    let mut a = a;
    let mut b = b;
    for _ in 0..8 {
        // mask = 0xFF if b&1==1 else 0x00
        let mask = (b & 1).wrapping_neg();
        p ^= a & mask;
        let hi = a & 0x80;
        a <<= 1;
        a ^= ((hi != 0) as u8) * 0x1B;
        b >>= 1;
    }
    p
}

/// Raise to the 254th power (b⁻¹ in GF(2⁸)) in constant time
#[inline(always)]
fn gf_inv(x: u8) -> u8 {
    // always do the full exponentiation, even for x==0
    let x2 = gf_mul(x, x);
    let x4 = gf_mul(x2, x2);
    let x8 = gf_mul(x4, x4);
    let x16 = gf_mul(x8, x8);
    let x32 = gf_mul(x16, x16);
    let x64 = gf_mul(x32, x32);
    let x128 = gf_mul(x64, x64);
    let mut y = gf_mul(x128, x64);
    y = gf_mul(y, x32);
    y = gf_mul(y, x16);
    y = gf_mul(y, x8);
    y = gf_mul(y, x4);
    y = gf_mul(y, x2);

    let mask = ((x != 0) as u8).wrapping_neg();
    y & mask
}

/// AES forward S-box: inv(x) ⊕ ROTL(inv(x),1–4) ⊕ 0x63
#[inline(always)]
fn bitsliced_sbox(x: u8) -> u8 {
    let i = gf_inv(x);
    i ^ i.rotate_left(1) ^ i.rotate_left(2) ^ i.rotate_left(3) ^ i.rotate_left(4) ^ 0x63
}

/// AES inverse S-box: undo affine then invert
#[inline(always)]
fn bitsliced_inv_sbox(x: u8) -> u8 {
    let y = x ^ 0x63;
    // A⁻¹ is convolution by t¹ + t³ + t⁶ mod (t⁸+1)
    let u = y.rotate_left(1) ^ y.rotate_left(3) ^ y.rotate_left(6);
    gf_inv(u)
}

/// Substitutes each byte in a word using the bitsliced S-box
#[inline(always)]
fn sub_word(word: u32) -> u32 {
    let bytes = word.to_be_bytes().map(bitsliced_sbox);
    u32::from_be_bytes(bytes)
}

/// Multiply by 2 in GF(2^8)
#[inline(always)]
fn mul2(byte: u8) -> u8 {
    let high = byte >> 7;
    (byte << 1) ^ (high * 0x1B)
}

#[inline(always)]
fn mul14(byte: u8) -> u8 {
    mul2(mul2(mul2(byte))) ^ mul2(mul2(byte)) ^ mul2(byte)
}
#[inline(always)]
fn mul13(byte: u8) -> u8 {
    mul2(mul2(mul2(byte))) ^ mul2(mul2(byte)) ^ byte
}
#[inline(always)]
fn mul11(byte: u8) -> u8 {
    mul2(mul2(mul2(byte))) ^ mul2(byte) ^ byte
}
#[inline(always)]
fn mul9(byte: u8) -> u8 {
    mul2(mul2(mul2(byte))) ^ byte
}

fn sub_bytes(state: &mut [u8; 16]) {
    for byte in state.iter_mut() {
        *byte = bitsliced_sbox(*byte);
    }
    // ensure no reordering around our bit-ops
    compiler_fence(Ordering::SeqCst);
}

fn inv_sub_bytes(state: &mut [u8; 16]) {
    for byte in state.iter_mut() {
        *byte = bitsliced_inv_sbox(*byte);
    }
    compiler_fence(Ordering::SeqCst);
}

/// Row r of the column-major state moves r columns to the left
fn shift_rows(state: &mut [u8; 16]) {
    let temp = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[c * 4 + r] = temp[((c + r) % 4) * 4 + r];
        }
    }
}

fn inv_shift_rows(state: &mut [u8; 16]) {
    let temp = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[((c + r) % 4) * 4 + r] = temp[c * 4 + r];
        }
    }
}

fn mix_columns(state: &mut [u8; 16]) {
    for column in state.chunks_exact_mut(4) {
        let [s0, s1, s2, s3] = [column[0], column[1], column[2], column[3]];
        column[0] = mul2(s0) ^ mul2(s1) ^ s1 ^ s2 ^ s3;
        column[1] = s0 ^ mul2(s1) ^ mul2(s2) ^ s2 ^ s3;
        column[2] = s0 ^ s1 ^ mul2(s2) ^ mul2(s3) ^ s3;
        column[3] = mul2(s0) ^ s0 ^ s1 ^ s2 ^ mul2(s3);
    }
}

fn inv_mix_columns(state: &mut [u8; 16]) {
    for column in state.chunks_exact_mut(4) {
        let [s0, s1, s2, s3] = [column[0], column[1], column[2], column[3]];
        column[0] = mul14(s0) ^ mul11(s1) ^ mul13(s2) ^ mul9(s3);
        column[1] = mul9(s0) ^ mul14(s1) ^ mul11(s2) ^ mul13(s3);
        column[2] = mul13(s0) ^ mul9(s1) ^ mul14(s2) ^ mul11(s3);
        column[3] = mul11(s0) ^ mul13(s1) ^ mul9(s2) ^ mul14(s3);
    }
}

#[inline(always)]
fn add_round_key(state: &mut [u8; 16], round_key: &[u8]) {
    for (s, k) in state.iter_mut().zip(round_key) {
        *s ^= *k;
    }
}

/// AES block cipher keyed with a 128, 192 or 256-bit key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Aes {
    round_keys: SecretBuffer<MAX_SCHEDULE>,
    #[zeroize(skip)]
    rounds: usize,
}

impl Aes {
    /// Expand `key` into a cipher instance.
    ///
    /// Fails with [`Error::KeySize`] unless the key is 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self> {
        let nk = match key.len() {
            AES128_KEY_SIZE | AES192_KEY_SIZE | AES256_KEY_SIZE => key.len() / 4,
            actual => {
                return Err(Error::KeySize {
                    algorithm: "AES",
                    actual,
                })
            }
        };
        let rounds = nk + 6;
        let round_keys = Self::expand_key(key, nk, rounds);
        Ok(Self { round_keys, rounds })
    }

    /// Number of rounds: 10, 12 or 14
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Key length in bytes this instance was created with
    pub fn key_len(&self) -> usize {
        (self.rounds - 6) * 4
    }

    fn expand_key(key: &[u8], nk: usize, rounds: usize) -> SecretBuffer<MAX_SCHEDULE> {
        let total = 4 * (rounds + 1);
        let mut words = [0u32; MAX_SCHEDULE / 4];

        for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        for i in nk..total {
            let mut temp = words[i - 1];
            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ RCON[i / nk];
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }
            words[i] = words[i - nk] ^ temp;
        }

        let mut schedule = SecretBuffer::zeroed();
        for (chunk, word) in schedule
            .as_mut_slice()
            .chunks_exact_mut(4)
            .zip(&words[..total])
        {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        words.zeroize();
        schedule
    }

    fn round_key(&self, round: usize) -> &[u8] {
        &self.round_keys.as_slice()[round * 16..(round + 1) * 16]
    }

    /// Touch every round key byte so cache state does not depend on the block
    fn warm_schedule(&self) {
        let mut warm: u8 = 0;
        for &b in &self.round_keys.as_slice()[..(self.rounds + 1) * 16] {
            warm = warm.wrapping_add(b);
        }
        core::hint::black_box(warm);
        compiler_fence(Ordering::SeqCst);
    }
}

impl BlockCipher for Aes {
    const BLOCK_SIZE: usize = AES_BLOCK_SIZE;

    fn name(&self) -> &'static str {
        match self.rounds {
            10 => "AES-128",
            12 => "AES-192",
            _ => "AES-256",
        }
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        validate::length("AES block", block.len(), AES_BLOCK_SIZE)?;
        self.warm_schedule();

        let mut state = [0u8; 16];
        state.copy_from_slice(block);

        add_round_key(&mut state, self.round_key(0));
        for round in 1..self.rounds {
            sub_bytes(&mut state);
            shift_rows(&mut state);
            mix_columns(&mut state);
            add_round_key(&mut state, self.round_key(round));
        }
        sub_bytes(&mut state);
        shift_rows(&mut state);
        add_round_key(&mut state, self.round_key(self.rounds));

        block.copy_from_slice(&state);
        state.zeroize();
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        validate::length("AES block", block.len(), AES_BLOCK_SIZE)?;
        self.warm_schedule();

        let mut state = [0u8; 16];
        state.copy_from_slice(block);

        add_round_key(&mut state, self.round_key(self.rounds));
        for round in (1..self.rounds).rev() {
            inv_shift_rows(&mut state);
            inv_sub_bytes(&mut state);
            add_round_key(&mut state, self.round_key(round));
            inv_mix_columns(&mut state);
        }
        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, self.round_key(0));

        block.copy_from_slice(&state);
        state.zeroize();
        Ok(())
    }
}

impl core::fmt::Debug for Aes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Aes").field("rounds", &self.rounds).finish_non_exhaustive()
    }
}

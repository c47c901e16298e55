//! Native library backend on top of OpenSSL's EVP interface
//!
//! Every one-shot call builds a fresh `Crypter` with padding disabled and the
//! chain value handed down by the transform, so no state survives between
//! calls inside the library.

use std::os::raw::c_ulong;

use openssl::error::ErrorStack;
use openssl::symm::{Cipher, Crypter, Mode};
use zeroize::Zeroize;

use api::error::{Error, Result};
use api::{AlgorithmId, BackendKind, BlockAlgorithm, CipherMode, Direction, NativeCode};
use api::{RawBlockCipher, RawSession};
use common::security::SecretVec;
use params::utils::symmetric::MAX_BLOCK_SIZE;

/// OpenSSL backed raw block cipher
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSslBackend;

impl OpenSslBackend {
    pub fn new() -> Self {
        Self
    }
}

fn evp_cipher(id: AlgorithmId, key_len: usize) -> Option<Cipher> {
    let cipher = match (id.algorithm, id.mode, key_len) {
        (BlockAlgorithm::Aes, CipherMode::Ecb, 16) => Cipher::aes_128_ecb(),
        (BlockAlgorithm::Aes, CipherMode::Ecb, 24) => Cipher::aes_192_ecb(),
        (BlockAlgorithm::Aes, CipherMode::Ecb, 32) => Cipher::aes_256_ecb(),
        (BlockAlgorithm::Aes, CipherMode::Cbc, 16) => Cipher::aes_128_cbc(),
        (BlockAlgorithm::Aes, CipherMode::Cbc, 24) => Cipher::aes_192_cbc(),
        (BlockAlgorithm::Aes, CipherMode::Cbc, 32) => Cipher::aes_256_cbc(),
        _ => return None,
    };
    Some(cipher)
}

fn native_code(stack: &ErrorStack) -> NativeCode {
    stack
        .errors()
        .first()
        .map(|e| code_from_packed(e.code()))
        .unwrap_or(NativeCode::INVALID_ARGUMENT)
}

/// Packed OpenSSL error code as a native code; codes that do not fit an
/// `i32` collapse to `EINVAL`
fn code_from_packed(code: c_ulong) -> NativeCode {
    i32::try_from(code)
        .map(NativeCode)
        .unwrap_or(NativeCode::INVALID_ARGUMENT)
}

impl RawBlockCipher for OpenSslBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NativeLibrary
    }

    fn supports(&self, id: AlgorithmId) -> bool {
        evp_cipher(id, id.algorithm.max_key_size()).is_some()
    }

    fn open_session(
        &self,
        id: AlgorithmId,
        key: &[u8],
        direction: Direction,
    ) -> Result<Box<dyn RawSession>> {
        let cipher = evp_cipher(id, key.len()).ok_or_else(|| {
            Error::unavailable(
                BackendKind::NativeLibrary,
                format!("no EVP cipher for {} with a {}-byte key", id, key.len()),
            )
        })?;

        // the library must accept the key before a session exists
        let zero_iv = [0u8; MAX_BLOCK_SIZE];
        let iv = cipher.iv_len().map(|len| &zero_iv[..len.min(MAX_BLOCK_SIZE)]);
        Crypter::new(cipher, mode_of(direction), key, iv).map_err(|e| {
            Error::unavailable(BackendKind::NativeLibrary, e.to_string())
        })?;

        Ok(Box::new(OpenSslSession {
            cipher,
            key: Some(SecretVec::from_slice(key)),
            direction,
        }))
    }
}

fn mode_of(direction: Direction) -> Mode {
    match direction {
        Direction::Encrypt => Mode::Encrypt,
        Direction::Decrypt => Mode::Decrypt,
    }
}

struct OpenSslSession {
    cipher: Cipher,
    key: Option<SecretVec>,
    direction: Direction,
}

impl RawSession for OpenSslSession {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn crypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        iv: Option<&[u8]>,
    ) -> core::result::Result<(), NativeCode> {
        let key = self.key.as_ref().ok_or(NativeCode::BAD_DESCRIPTOR)?;
        let block_size = self.cipher.block_size();
        if input.len() != output.len() || input.len() % block_size != 0 {
            return Err(NativeCode::INVALID_ARGUMENT);
        }

        let mut crypter = Crypter::new(self.cipher, mode_of(self.direction), key.as_slice(), iv)
            .map_err(|e| native_code(&e))?;
        crypter.pad(false);

        let mut buf = vec![0u8; input.len() + block_size];
        let result = crypter
            .update(input, &mut buf)
            .and_then(|n| crypter.finalize(&mut buf[n..]).map(|m| n + m))
            .map_err(|e| native_code(&e));

        let outcome = match result {
            Ok(written) if written == input.len() => {
                output.copy_from_slice(&buf[..written]);
                Ok(())
            }
            Ok(_) => Err(NativeCode::INVALID_ARGUMENT),
            Err(code) => Err(code),
        };
        buf.zeroize();
        outcome
    }

    fn close(&mut self) -> Result<()> {
        self.key = None;
        Ok(())
    }
}

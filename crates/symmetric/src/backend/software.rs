//! Pure Rust software backend
//!
//! Serves every (algorithm, mode) pair cryptsel knows with no chunk limit.
//! It is appended to every registry as the last candidate and never probed.

use algorithms::block::{Aes, Cbc, Ecb};
use api::error::{Error, Result};
use api::{AlgorithmId, BackendKind, BlockAlgorithm, CipherMode, Direction, NativeCode};
use api::{RawBlockCipher, RawSession};

/// Software implementation of the raw block cipher boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl SoftwareBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RawBlockCipher for SoftwareBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }

    fn supports(&self, id: AlgorithmId) -> bool {
        matches!(id.algorithm, BlockAlgorithm::Aes)
    }

    fn open_session(
        &self,
        id: AlgorithmId,
        key: &[u8],
        direction: Direction,
    ) -> Result<Box<dyn RawSession>> {
        let cipher = match id.algorithm {
            BlockAlgorithm::Aes => Aes::new(key).map_err(Error::from)?,
            #[allow(unreachable_patterns)]
            _ => {
                return Err(Error::unavailable(
                    BackendKind::Software,
                    format!("{} is not implemented in software", id),
                ))
            }
        };

        Ok(Box::new(SoftwareSession {
            cipher: Some(cipher),
            mode: id.mode,
            direction,
        }))
    }

    fn probe(&self, _id: AlgorithmId) -> Result<()> {
        Ok(())
    }
}

/// Session holding an expanded key schedule; `None` once closed
struct SoftwareSession {
    cipher: Option<Aes>,
    mode: CipherMode,
    direction: Direction,
}

impl RawSession for SoftwareSession {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn crypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        iv: Option<&[u8]>,
    ) -> core::result::Result<(), NativeCode> {
        let cipher = self.cipher.as_ref().ok_or(NativeCode::BAD_DESCRIPTOR)?;
        if input.len() != output.len() {
            return Err(NativeCode::INVALID_ARGUMENT);
        }
        output.copy_from_slice(input);

        let outcome = match (self.mode, self.direction) {
            (CipherMode::Ecb, Direction::Encrypt) => Ecb::new(cipher).encrypt_in_place(output),
            (CipherMode::Ecb, Direction::Decrypt) => Ecb::new(cipher).decrypt_in_place(output),
            (CipherMode::Cbc, direction) => {
                let iv = iv.ok_or(NativeCode::INVALID_ARGUMENT)?;
                let mut cbc = Cbc::new(cipher, iv).map_err(|_| NativeCode::INVALID_ARGUMENT)?;
                if direction.is_encrypt() {
                    cbc.encrypt_in_place(output)
                } else {
                    cbc.decrypt_in_place(output)
                }
            }
        };

        outcome.map_err(|e| {
            tracing::debug!(error = %e, "software crypt rejected request");
            NativeCode::INVALID_ARGUMENT
        })
    }

    fn close(&mut self) -> Result<()> {
        self.cipher = None;
        Ok(())
    }
}

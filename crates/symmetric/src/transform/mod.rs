//! Streaming block transforms
//!
//! A [`BlockTransform`] turns a raw backend session, which only handles
//! whole blocks and knows nothing about padding, into a streaming cipher:
//! any number of block aligned [`update`](BlockTransform::update) calls
//! followed by exactly one [`finalize`](BlockTransform::finalize) that may
//! take a partial block and applies or strips padding.
//!
//! When decrypting under a strict padding mode the transform always holds
//! back the last block it has seen, because until `finalize` runs it cannot
//! know whether that block carries padding.
//!
//! ```text
//! Idle --update--> Streaming --finalize--> Finalized
//!   \__________________finalize_______________/^
//! ```

mod driver;
mod session;

pub use driver::effective_chunk_size;
pub use session::CipherSession;

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::padding;
use api::error::{validate, Error, Result};
use api::{
    AlgorithmId, BackendKind, BlockAlgorithm, CipherMode, Direction, PaddingMode, RawBlockCipher,
};
use driver::{ChainState, ChunkedDriver};

/// Lifecycle of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformState {
    /// Created, nothing processed yet
    Idle,
    /// At least one update accepted
    Streaming,
    /// Final call ran, or a failure made the transform unusable
    Finalized,
}

/// Everything needed to build a transform apart from the backend
#[derive(Clone, Copy)]
pub struct TransformParams<'a> {
    pub algorithm: BlockAlgorithm,
    pub key: &'a [u8],
    pub iv: Option<&'a [u8]>,
    pub mode: CipherMode,
    pub padding: PaddingMode,
}

impl<'a> TransformParams<'a> {
    /// CBC with PKCS7 padding and a random IV unless changed
    pub fn new(algorithm: BlockAlgorithm, key: &'a [u8]) -> Self {
        Self {
            algorithm,
            key,
            iv: None,
            mode: CipherMode::default(),
            padding: PaddingMode::default(),
        }
    }

    /// Like [`TransformParams::new`] with the algorithm given by name
    pub fn by_name(name: &str, key: &'a [u8]) -> Result<Self> {
        Ok(Self::new(BlockAlgorithm::from_name(name)?, key))
    }

    pub fn iv(mut self, iv: &'a [u8]) -> Self {
        self.iv = Some(iv);
        self
    }

    pub fn mode(mut self, mode: CipherMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn padding(mut self, padding: PaddingMode) -> Self {
        self.padding = padding;
        self
    }

    pub fn algorithm_id(&self) -> AlgorithmId {
        AlgorithmId::new(self.algorithm, self.mode)
    }

    /// Reject keys and IVs no backend could use
    pub fn check(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidKey {
                context: "transform key",
                message: "key must not be empty".into(),
            });
        }
        if !self.algorithm.is_valid_key_len(self.key.len()) {
            return Err(Error::InvalidKey {
                context: "transform key",
                message: format!(
                    "{} does not accept a {}-byte key (supported: {:?})",
                    self.algorithm,
                    self.key.len(),
                    self.algorithm.key_sizes()
                ),
            });
        }
        if let (CipherMode::Cbc, Some(iv)) = (self.mode, self.iv) {
            validate::min_length("initialization vector", iv.len(), self.algorithm.block_size())?;
        }
        Ok(())
    }

    /// IV the transform starts from: the caller's (truncated to one block)
    /// or a fresh random one. `None` for ECB.
    fn initial_iv(&self) -> Option<Vec<u8>> {
        if !self.mode.is_chained() {
            return None;
        }
        let bs = self.algorithm.block_size();
        Some(match self.iv {
            Some(iv) => iv[..bs].to_vec(),
            None => {
                let mut iv = vec![0u8; bs];
                OsRng.fill_bytes(&mut iv);
                iv
            }
        })
    }
}

impl core::fmt::Debug for TransformParams<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TransformParams")
            .field("algorithm", &self.algorithm)
            .field("key_len", &self.key.len())
            .field("iv", &self.iv.is_some())
            .field("mode", &self.mode)
            .field("padding", &self.padding)
            .finish()
    }
}

/// A streaming encryptor or decryptor bound to one backend session
pub struct BlockTransform {
    driver: ChunkedDriver,
    id: AlgorithmId,
    direction: Direction,
    padding: PaddingMode,
    state: TransformState,
    /// Withheld input block, only used when decrypting with strict padding
    pending: Option<Zeroizing<Vec<u8>>>,
    initial_iv: Option<Vec<u8>>,
}

impl BlockTransform {
    /// Open a session on `backend` and wrap it.
    ///
    /// `chunk_cap` further limits the backend's own single-shot size.
    pub fn open(
        backend: &dyn RawBlockCipher,
        direction: Direction,
        params: &TransformParams<'_>,
        chunk_cap: Option<usize>,
    ) -> Result<Self> {
        params.check()?;

        let id = params.algorithm_id();
        let block_size = id.block_size();
        let max_chunk = effective_chunk_size(backend.max_chunk_size(id), chunk_cap, block_size);
        let initial_iv = params.initial_iv();

        let raw = backend.open_session(id, params.key, direction)?;
        let session = CipherSession::new(raw, backend.kind());
        let chain = initial_iv.as_deref().map(ChainState::new);

        tracing::debug!(
            algorithm = %id,
            padding = %params.padding,
            %direction,
            backend = %backend.kind(),
            max_chunk,
            "opened block transform"
        );

        Ok(Self {
            driver: ChunkedDriver::new(session, chain, block_size, max_chunk),
            id,
            direction,
            padding: params.padding,
            state: TransformState::Idle,
            pending: None,
            initial_iv,
        })
    }

    pub fn block_size(&self) -> usize {
        self.id.block_size()
    }

    pub fn algorithm(&self) -> AlgorithmId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> CipherMode {
        self.id.mode
    }

    pub fn padding(&self) -> PaddingMode {
        self.padding
    }

    pub fn backend(&self) -> BackendKind {
        self.driver.session().backend()
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    /// Largest number of bytes handed to the backend in one call
    pub fn max_chunk_size(&self) -> usize {
        self.driver.max_chunk()
    }

    /// IV the chain started from; `None` in ECB mode
    pub fn initial_iv(&self) -> Option<&[u8]> {
        self.initial_iv.as_deref()
    }

    /// Whether the last block seen is withheld until the final call
    fn keeps_last_block(&self) -> bool {
        self.direction == Direction::Decrypt && self.padding.is_strict()
    }

    /// Bytes an update with `input_len` bytes of input will produce
    pub fn update_output_len(&self, input_len: usize) -> usize {
        if input_len == 0 || !self.keeps_last_block() {
            return input_len;
        }
        let held = self.pending.as_ref().map_or(0, |p| p.len());
        held + input_len - self.block_size()
    }

    fn ensure_open(&self, context: &'static str) -> Result<()> {
        if self.state == TransformState::Finalized {
            return Err(Error::AlreadyFinalized { context });
        }
        Ok(())
    }

    /// Mark the transform unusable when `result` failed
    fn fail_on_err<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = TransformState::Finalized;
            self.pending = None;
        }
        result
    }

    /// Process block aligned `input` into `output`, returning the number of
    /// bytes written.
    ///
    /// `output` must hold at least [`update_output_len`](Self::update_output_len)
    /// bytes.
    pub fn update_into(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.ensure_open("update")?;
        validate::block_aligned("update", input.len(), self.block_size())?;

        let produced = self.update_output_len(input.len());
        validate::min_length("update output", output.len(), produced)?;
        self.state = TransformState::Streaming;
        if input.is_empty() {
            return Ok(0);
        }

        let result = self.process(input, &mut output[..produced]);
        self.fail_on_err(result)?;
        Ok(produced)
    }

    /// Allocating form of [`update_into`](Self::update_into)
    pub fn update(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open("update")?;
        validate::block_aligned("update", input.len(), self.block_size())?;
        let mut output = vec![0u8; self.update_output_len(input.len())];
        let written = self.update_into(input, &mut output)?;
        output.truncate(written);
        Ok(output)
    }

    fn process(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        if !self.keeps_last_block() {
            return self.driver.transform(input, output);
        }

        let bs = self.block_size();
        let (body, last) = input.split_at(input.len() - bs);
        let mut offset = 0;

        if let Some(held) = self.pending.take() {
            self.driver.transform(&held, &mut output[..bs])?;
            offset = bs;
        }
        self.driver.transform(body, &mut output[offset..])?;
        self.pending = Some(Zeroizing::new(last.to_vec()));
        Ok(())
    }

    /// Process the last piece of the message and end the transform.
    ///
    /// Encrypting accepts any length and pads. Decrypting needs block aligned
    /// input and strips padding. Whatever the outcome the transform is
    /// finalized afterwards and its session released.
    pub fn finalize(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.ensure_open("final")?;

        let result = match self.direction {
            Direction::Encrypt => self.finalize_encrypt(input),
            Direction::Decrypt => self.finalize_decrypt(input),
        };

        self.state = TransformState::Finalized;
        self.pending = None;
        if let Err(e) = self.driver.close() {
            tracing::warn!(backend = %self.backend(), error = %e, "closing session after final block failed");
        }
        result
    }

    fn finalize_encrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let bs = self.block_size();
        let aligned = input.len() - input.len() % bs;
        let (body, tail) = input.split_at(aligned);

        let last = padding::pad(self.padding, tail, bs, &mut OsRng)?;
        let total = aligned + last.as_ref().map_or(0, |b| b.len());

        let mut output = vec![0u8; total];
        self.driver.transform(body, &mut output[..aligned])?;
        if let Some(block) = last {
            self.driver.transform(&block, &mut output[aligned..])?;
        }
        Ok(output)
    }

    fn finalize_decrypt(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let bs = self.block_size();
        validate::block_aligned("final", input.len(), bs)?;

        let mut data = Zeroizing::new(Vec::with_capacity(bs + input.len()));
        if let Some(held) = self.pending.take() {
            data.extend_from_slice(&held);
        }
        data.extend_from_slice(input);

        let mut output = vec![0u8; data.len()];
        self.driver.transform(&data, &mut output)?;

        match padding::unpad(self.padding, &output, bs) {
            Ok(keep) => {
                output[keep..].zeroize();
                output.truncate(keep);
                Ok(output)
            }
            Err(e) => {
                output.zeroize();
                Err(e)
            }
        }
    }

    /// End the transform without a final block and close its session
    pub fn dispose(mut self) -> Result<()> {
        self.state = TransformState::Finalized;
        self.pending = None;
        self.driver.close()
    }
}

impl core::fmt::Debug for BlockTransform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockTransform")
            .field("algorithm", &self.id)
            .field("direction", &self.direction)
            .field("padding", &self.padding)
            .field("backend", &self.backend())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//! Chunked I/O driver
//!
//! Feeds block aligned data to the backend in pieces no larger than the
//! backend's single-shot limit and carries the CBC chain value across
//! pieces, since backends keep no chain state between calls.

use zeroize::Zeroizing;

use super::session::CipherSession;
use api::error::{validate, Result};
use api::Direction;

/// Running chain value for chained modes
pub(crate) struct ChainState {
    iv: Zeroizing<Vec<u8>>,
}

impl ChainState {
    pub(crate) fn new(iv: &[u8]) -> Self {
        Self {
            iv: Zeroizing::new(iv.to_vec()),
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.iv
    }

    fn replace(&mut self, block: &[u8]) {
        self.iv.copy_from_slice(block);
    }
}

/// Largest single-shot size for a backend limit and an optional global cap:
/// the smaller of the two, rounded down to whole blocks, at least one block
pub fn effective_chunk_size(
    backend_limit: Option<usize>,
    cap: Option<usize>,
    block_size: usize,
) -> usize {
    let limit = match (backend_limit, cap) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => usize::MAX,
    };
    (limit - limit % block_size).max(block_size)
}

pub(crate) struct ChunkedDriver {
    session: CipherSession,
    chain: Option<ChainState>,
    block_size: usize,
    max_chunk: usize,
}

impl ChunkedDriver {
    pub(crate) fn new(
        session: CipherSession,
        chain: Option<ChainState>,
        block_size: usize,
        max_chunk: usize,
    ) -> Self {
        Self {
            session,
            chain,
            block_size,
            max_chunk,
        }
    }

    pub(crate) fn session(&self) -> &CipherSession {
        &self.session
    }

    pub(crate) fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        self.session.close()
    }

    /// Transform `input` into `output`, chunk by chunk.
    ///
    /// Errors are not retried. Output already written for earlier chunks is
    /// left in place; the caller must discard the whole operation.
    pub(crate) fn transform(&mut self, input: &[u8], output: &mut [u8]) -> Result<()> {
        let bs = self.block_size;
        validate::block_aligned("chunked transform", input.len(), bs)?;
        validate::length("chunked transform output", output.len(), input.len())?;
        if input.is_empty() {
            return Ok(());
        }

        let decrypting = self.session.direction() == Direction::Decrypt;

        for (chunk_in, chunk_out) in input
            .chunks(self.max_chunk)
            .zip(output.chunks_mut(self.max_chunk))
        {
            let len = chunk_in.len();

            // the next chain value when decrypting is the last ciphertext
            // block consumed, copied out before the raw call
            let saved = match (&self.chain, decrypting) {
                (Some(_), true) => Some(Zeroizing::new(chunk_in[len - bs..].to_vec())),
                _ => None,
            };

            let iv = self.chain.as_ref().map(ChainState::as_slice);
            self.session.crypt(chunk_in, chunk_out, iv)?;

            if let Some(chain) = self.chain.as_mut() {
                match saved {
                    Some(block) => chain.replace(&block),
                    None => chain.replace(&chunk_out[len - bs..]),
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn chain(&self) -> Option<&[u8]> {
        self.chain.as_ref().map(ChainState::as_slice)
    }
}

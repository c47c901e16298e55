//! Raw block cipher backends
//!
//! A backend can only encrypt or decrypt an exact multiple of the block size
//! in one call and knows nothing about padding. Everything else (streaming,
//! chaining state between calls, padding, chunking) lives above this line.
//!
//! Backends are registered with the selector as trait objects, so the
//! traits are object safe and thread safe: a [`RawBlockCipher`] is shared by
//! every transform, a [`RawSession`] is owned by exactly one.

use crate::error::{Error, Result};
use crate::types::{AlgorithmId, BackendKind, Direction, NativeCode};
use params::utils::symmetric::PROBE_KEY_SIZE;

/// All-zero key used to open throwaway probe sessions
pub const PROBE_KEY: [u8; PROBE_KEY_SIZE] = [0u8; PROBE_KEY_SIZE];

/// One open backend session, bound to a single (algorithm, key, direction)
pub trait RawSession: Send {
    /// Direction fixed when the session was opened
    fn direction(&self) -> Direction;

    /// Transform `input` into `output` in one shot.
    ///
    /// Both slices have the same length, a multiple of the block size and
    /// no larger than the backend's declared chunk limit. `iv` is the chain
    /// value for chained modes and `None` otherwise; the backend must not
    /// rely on carrying chain state across calls.
    fn crypt(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        iv: Option<&[u8]>,
    ) -> core::result::Result<(), NativeCode>;

    /// Release the native session. Calling it twice must be harmless.
    fn close(&mut self) -> Result<()>;
}

/// A raw block cipher backend
pub trait RawBlockCipher: Send + Sync {
    /// Kind of backend, also the availability cache key
    fn kind(&self) -> BackendKind;

    /// Static filter for algorithms the backend can never serve.
    ///
    /// Returning `false` skips the probe entirely.
    fn supports(&self, id: AlgorithmId) -> bool {
        let _ = id;
        true
    }

    /// Largest number of bytes a single [`RawSession::crypt`] call accepts,
    /// `None` when unbounded.
    ///
    /// Offload engines that cannot loop internally should report their
    /// engine limit, or
    /// [`OFFLOAD_MAX_CHUNK_SIZE`](params::utils::symmetric::OFFLOAD_MAX_CHUNK_SIZE)
    /// when it is not known.
    fn max_chunk_size(&self, id: AlgorithmId) -> Option<usize> {
        let _ = id;
        None
    }

    /// Open a session for `id` keyed with `key`.
    ///
    /// Must fail with [`Error::BackendUnavailable`] when the backend cannot
    /// serve the algorithm, so the selector moves on to the next candidate.
    fn open_session(
        &self,
        id: AlgorithmId,
        key: &[u8],
        direction: Direction,
    ) -> Result<Box<dyn RawSession>>;

    /// Capability probe: open a throwaway session with an all-zero key and
    /// close it again. Expensive; the selector runs it once per algorithm.
    fn probe(&self, id: AlgorithmId) -> Result<()> {
        if !self.supports(id) {
            return Err(Error::unavailable(
                self.kind(),
                format!("{} is not supported", id),
            ));
        }
        let key_len = id.algorithm.max_key_size().min(PROBE_KEY.len());
        let mut session = self.open_session(id, &PROBE_KEY[..key_len], Direction::Encrypt)?;
        session.close()
    }
}

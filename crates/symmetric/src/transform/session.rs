//! Ownership of one open backend session

use api::error::{Error, Result};
use api::{BackendKind, Direction, RawSession};

/// A backend session owned by exactly one transform.
///
/// The native session is closed exactly once: by [`CipherSession::close`],
/// or on drop if nobody closed it explicitly.
pub struct CipherSession {
    inner: Box<dyn RawSession>,
    backend: BackendKind,
    closed: bool,
}

impl CipherSession {
    pub fn new(inner: Box<dyn RawSession>, backend: BackendKind) -> Self {
        Self {
            inner,
            backend,
            closed: false,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn direction(&self) -> Direction {
        self.inner.direction()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// One raw call; native failures become [`Error::BackendOperationFailed`]
    pub fn crypt(&mut self, input: &[u8], output: &mut [u8], iv: Option<&[u8]>) -> Result<()> {
        if self.closed {
            return Err(Error::AlreadyFinalized {
                context: "session closed",
            });
        }
        self.inner.crypt(input, output, iv).map_err(|code| {
            tracing::error!(backend = %self.backend, %code, len = input.len(), "raw crypt failed");
            Error::BackendOperationFailed {
                backend: self.backend,
                code,
            }
        })
    }

    /// Close the native session. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}

impl Drop for CipherSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(backend = %self.backend, error = %e, "failed to close backend session");
        }
    }
}

impl core::fmt::Debug for CipherSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CipherSession")
            .field("backend", &self.backend)
            .field("closed", &self.closed)
            .finish()
    }
}

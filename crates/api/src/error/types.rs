//! Error type definitions for cipher transforms and backend selection

use thiserror::Error as ThisError;

use crate::types::{BackendKind, NativeCode};

/// Primary error type for cryptsel operations
///
/// The first five variants form the taxonomy every transform exposes to its
/// caller. The remaining variants cover argument validation.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// A byte count that must be a whole number of blocks was not
    #[error("{context}: {actual} bytes is not a multiple of the {block_size}-byte block size")]
    InvalidBlockLength {
        context: &'static str,
        block_size: usize,
        actual: usize,
    },

    /// The final block's padding did not verify
    ///
    /// Carries no position or length detail on purpose.
    #[error("bad padding: {context}")]
    BadPadding { context: &'static str },

    /// No session could be opened for the algorithm on this backend
    #[error("backend {backend} unavailable: {message}")]
    BackendUnavailable {
        backend: BackendKind,
        message: String,
    },

    /// A raw crypt call failed after its session was opened
    #[error("backend {backend} operation failed with {code}")]
    BackendOperationFailed {
        backend: BackendKind,
        code: NativeCode,
    },

    /// The transform already ran its final step (or failed)
    #[error("{context}: transform already finalized")]
    AlreadyFinalized { context: &'static str },

    /// Invalid key error
    #[error("invalid key: {context}: {message}")]
    InvalidKey {
        context: &'static str,
        message: String,
    },

    /// Invalid length error with context
    #[error("{context}: invalid length (expected {expected}, got {actual})")]
    InvalidLength {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Invalid parameter error
    #[error("{context}: {message}")]
    InvalidParameter {
        context: &'static str,
        message: String,
    },

    /// Other error
    #[error("{context}: {message}")]
    Other {
        context: &'static str,
        message: String,
    },
}

/// Result type for cryptsel operations
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Shorthand for an `InvalidParameter` error
    pub fn param(context: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            context,
            message: message.into(),
        }
    }

    /// Shorthand for a `BackendUnavailable` error
    pub fn unavailable(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            message: message.into(),
        }
    }

    /// Replace the context of an error, keeping its payload
    pub fn with_context(self, context: &'static str) -> Self {
        match self {
            Self::InvalidBlockLength {
                block_size, actual, ..
            } => Self::InvalidBlockLength {
                context,
                block_size,
                actual,
            },
            Self::BadPadding { .. } => Self::BadPadding { context },
            Self::AlreadyFinalized { .. } => Self::AlreadyFinalized { context },
            Self::InvalidKey { message, .. } => Self::InvalidKey { context, message },
            Self::InvalidLength {
                expected, actual, ..
            } => Self::InvalidLength {
                context,
                expected,
                actual,
            },
            Self::InvalidParameter { message, .. } => Self::InvalidParameter { context, message },
            Self::Other { message, .. } => Self::Other { context, message },
            other => other,
        }
    }

    /// Whether this error should move selection on to the next backend
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }
}

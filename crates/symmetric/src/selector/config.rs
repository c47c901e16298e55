//! Selector configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use api::error::{Error, Result};
use api::BackendKind;

/// Environment variable listing backend kinds to skip, comma separated
pub const DISABLE_BACKENDS_VAR: &str = "CRYPTSEL_DISABLE_BACKENDS";

/// Environment variable capping the single-shot size in bytes
pub const MAX_CHUNK_VAR: &str = "CRYPTSEL_MAX_CHUNK";

/// Knobs for backend selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelectorConfig {
    /// Backend kinds never probed nor selected. The software fallback
    /// cannot be disabled.
    pub disabled: Vec<BackendKind>,
    /// Global cap on the bytes handed to a backend in one call
    pub max_chunk_size: Option<usize>,
}

impl SelectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled(mut self, kind: BackendKind) -> Self {
        if kind != BackendKind::Software && !self.disabled.contains(&kind) {
            self.disabled.push(kind);
        }
        self
    }

    pub fn with_max_chunk_size(mut self, bytes: usize) -> Self {
        self.max_chunk_size = Some(bytes);
        self
    }

    pub fn is_disabled(&self, kind: BackendKind) -> bool {
        kind != BackendKind::Software && self.disabled.contains(&kind)
    }

    /// Read [`DISABLE_BACKENDS_VAR`] and [`MAX_CHUNK_VAR`]
    pub fn from_env() -> Result<Self> {
        let disabled = std::env::var(DISABLE_BACKENDS_VAR).ok();
        let max_chunk = std::env::var(MAX_CHUNK_VAR).ok();
        Self::from_values(disabled.as_deref(), max_chunk.as_deref())
    }

    /// Parse the raw values of the two environment variables
    pub fn from_values(disabled: Option<&str>, max_chunk: Option<&str>) -> Result<Self> {
        let mut config = Self::new();

        for name in disabled.unwrap_or("").split(',').map(str::trim) {
            if name.is_empty() {
                continue;
            }
            let kind: BackendKind = name.parse()?;
            if kind == BackendKind::Software {
                return Err(Error::param(
                    DISABLE_BACKENDS_VAR,
                    "the software backend cannot be disabled",
                ));
            }
            config = config.with_disabled(kind);
        }

        if let Some(raw) = max_chunk.map(str::trim).filter(|s| !s.is_empty()) {
            let bytes: usize = raw.parse().map_err(|_| {
                Error::param(MAX_CHUNK_VAR, format!("'{}' is not a byte count", raw))
            })?;
            if bytes == 0 {
                return Err(Error::param(MAX_CHUNK_VAR, "must be greater than zero"));
            }
            config = config.with_max_chunk_size(bytes);
        }

        Ok(config)
    }
}

//! Backend selection
//!
//! A [`Registry`] holds the backend candidates in priority order. For each
//! (algorithm, mode) it probes candidates once, remembers the first one that
//! works and falls back to the pure software backend when none does.
//!
//! ```no_run
//! use cryptsel_symmetric::selector::{RegistryBuilder, SelectorConfig};
//! use cryptsel_symmetric::transform::TransformParams;
//! use cryptsel_symmetric::BlockAlgorithm;
//! # fn main() -> cryptsel_symmetric::Result<()> {
//! let registry = RegistryBuilder::new()
//!     .config(SelectorConfig::from_env()?)
//!     .build();
//! let key = [0u8; 16];
//! let params = TransformParams::new(BlockAlgorithm::Aes, &key);
//! let mut encryptor = registry.encryptor(&params)?;
//! let ciphertext = encryptor.finalize(b"attack at dawn")?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;

pub use cache::AvailabilityCache;
pub use config::{SelectorConfig, DISABLE_BACKENDS_VAR, MAX_CHUNK_VAR};

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::instrument;

use crate::backend::SoftwareBackend;
use crate::transform::{BlockTransform, TransformParams};
use api::error::{Error, Result};
use api::{AlgorithmId, BackendKind, BlockAlgorithm, CipherMode, Direction, RawBlockCipher};

/// One registered backend for one algorithm family
#[derive(Clone)]
pub struct BackendCandidate {
    pub algorithm: BlockAlgorithm,
    pub backend: Arc<dyn RawBlockCipher>,
}

impl BackendCandidate {
    pub fn new<B: RawBlockCipher + 'static>(algorithm: BlockAlgorithm, backend: B) -> Self {
        Self {
            algorithm,
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(algorithm: BlockAlgorithm, backend: Arc<dyn RawBlockCipher>) -> Self {
        Self { algorithm, backend }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }
}

impl core::fmt::Debug for BackendCandidate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BackendCandidate")
            .field("algorithm", &self.algorithm)
            .field("kind", &self.kind())
            .finish()
    }
}

/// The backend chosen for an algorithm
#[derive(Clone)]
pub struct Resolution {
    backend: Arc<dyn RawBlockCipher>,
    kind: BackendKind,
    /// Position in the candidate list; `None` for the software fallback
    position: Option<usize>,
}

impl Resolution {
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn backend(&self) -> &Arc<dyn RawBlockCipher> {
        &self.backend
    }

    pub fn is_fallback(&self) -> bool {
        self.position.is_none()
    }
}

impl core::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resolution")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .finish()
    }
}

/// Collects candidates before the registry is frozen
#[derive(Default)]
pub struct RegistryBuilder {
    candidates: Vec<BackendCandidate>,
    config: SelectorConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a candidate; earlier registrations take priority.
    ///
    /// A second candidate with the same algorithm and backend kind is
    /// rejected, as is registering the software kind, which is always
    /// present as the last resort.
    pub fn register(mut self, candidate: BackendCandidate) -> Result<Self> {
        let kind = candidate.kind();
        if kind == BackendKind::Software {
            return Err(Error::param(
                "backend candidate",
                "the software backend is always registered last",
            ));
        }
        if self
            .candidates
            .iter()
            .any(|c| c.algorithm == candidate.algorithm && c.kind() == kind)
        {
            return Err(Error::param(
                "backend candidate",
                format!("{} already has a {} backend", candidate.algorithm, kind),
            ));
        }
        self.candidates.push(candidate);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        tracing::info!(
            candidates = self.candidates.len(),
            disabled = ?self.config.disabled,
            "backend registry built"
        );
        Registry {
            candidates: self.candidates,
            software: Arc::new(SoftwareBackend),
            config: self.config,
            cache: AvailabilityCache::new(),
            resolved: Mutex::new(HashMap::new()),
        }
    }
}

type ResolvedSlot = Arc<OnceCell<RwLock<Resolution>>>;

/// Immutable set of backend candidates plus the probe and resolution caches
pub struct Registry {
    candidates: Vec<BackendCandidate>,
    software: Arc<dyn RawBlockCipher>,
    config: SelectorConfig,
    cache: AvailabilityCache,
    resolved: Mutex<HashMap<AlgorithmId, ResolvedSlot>>,
}

impl Default for Registry {
    /// Only the software backend
    fn default() -> Self {
        RegistryBuilder::new().build()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn candidates(&self) -> &[BackendCandidate] {
        &self.candidates
    }

    /// Cached probe outcome for a backend kind, `None` if never probed
    pub fn availability(&self, id: AlgorithmId, kind: BackendKind) -> Option<bool> {
        self.cache.get(id, kind)
    }

    /// Backend serving `algorithm` in `mode`, decided once per pair and
    /// revised only when the chosen backend fails its first real use
    pub fn resolve(&self, algorithm: BlockAlgorithm, mode: CipherMode) -> Resolution {
        let slot = self.resolved_slot(AlgorithmId::new(algorithm, mode));
        let resolution = slot.get().expect("slot initialized by resolved_slot").read().clone();
        resolution
    }

    fn slot(&self, id: AlgorithmId) -> ResolvedSlot {
        self.resolved.lock().entry(id).or_default().clone()
    }

    fn resolved_slot(&self, id: AlgorithmId) -> ResolvedSlot {
        let slot = self.slot(id);
        slot.get_or_init(|| {
            let resolution = self.select(id, 0);
            tracing::info!(algorithm = %id, backend = %resolution.kind, "backend selected");
            RwLock::new(resolution)
        });
        slot
    }

    /// Drop the candidate at `position` for `id` and move the cached choice
    /// past it. Returns the new choice.
    fn demote(&self, id: AlgorithmId, position: usize, kind: BackendKind) -> Resolution {
        self.cache.mark_unavailable(id, kind);
        let next = self.select(id, position + 1);

        let slot = self.resolved_slot(id);
        let mut current = slot.get().expect("slot initialized by resolved_slot").write();
        // another thread may already have moved past this candidate
        if current.position == Some(position) {
            tracing::info!(
                algorithm = %id,
                from = %kind,
                backend = %next.kind,
                "backend selection revised"
            );
            *current = next.clone();
        }
        next
    }

    /// First available candidate at or after `start`, else the software one
    fn select(&self, id: AlgorithmId, start: usize) -> Resolution {
        let found = self
            .candidates
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(_, c)| c.algorithm == id.algorithm && !self.config.is_disabled(c.kind()))
            .find(|(_, c)| self.cache.is_available(id, c.backend.as_ref()));

        match found {
            Some((position, candidate)) => Resolution {
                backend: candidate.backend.clone(),
                kind: candidate.kind(),
                position: Some(position),
            },
            None => Resolution {
                backend: self.software.clone(),
                kind: BackendKind::Software,
                position: None,
            },
        }
    }

    /// Build a transform on the resolved backend.
    ///
    /// If that backend cannot open a session after all, it is marked
    /// unavailable, the remaining candidates and finally the software backend
    /// are tried, and the cached resolution moves to whichever answers.
    #[instrument(level = "debug", skip(self, params), fields(algorithm = %params.algorithm_id()))]
    pub fn create(&self, direction: Direction, params: &TransformParams<'_>) -> Result<BlockTransform> {
        params.check()?;
        let id = params.algorithm_id();
        let mut resolution = self.resolve(id.algorithm, id.mode);
        let cap = self.config.max_chunk_size;

        loop {
            match BlockTransform::open(resolution.backend.as_ref(), direction, params, cap) {
                Ok(transform) => return Ok(transform),
                Err(e) if e.is_unavailable() => match resolution.position {
                    Some(position) => {
                        tracing::warn!(
                            algorithm = %id,
                            backend = %resolution.kind,
                            error = %e,
                            "session open failed, falling back"
                        );
                        resolution = self.demote(id, position, resolution.kind);
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }

    pub fn encryptor(&self, params: &TransformParams<'_>) -> Result<BlockTransform> {
        self.create(Direction::Encrypt, params)
    }

    pub fn decryptor(&self, params: &TransformParams<'_>) -> Result<BlockTransform> {
        self.create(Direction::Decrypt, params)
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("candidates", &self.candidates)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

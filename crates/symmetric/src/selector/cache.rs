//! Memoized capability probes
//!
//! One entry per (algorithm, backend kind). The first caller for a key runs
//! the probe; concurrent callers for the same key block until it finishes
//! and then share its answer. Other keys are never blocked.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use api::{AlgorithmId, BackendKind, RawBlockCipher};

type Slot = Arc<OnceCell<bool>>;

/// Process-scoped record of which backends serve which algorithms
#[derive(Default)]
pub struct AvailabilityCache {
    slots: Mutex<HashMap<(AlgorithmId, BackendKind), Slot>>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: AlgorithmId, kind: BackendKind) -> Slot {
        self.slots.lock().entry((id, kind)).or_default().clone()
    }

    /// Cached answer, or `None` if the pair was never probed
    pub fn get(&self, id: AlgorithmId, kind: BackendKind) -> Option<bool> {
        let slot = self.slots.lock().get(&(id, kind)).cloned()?;
        slot.get().copied()
    }

    /// Whether `backend` serves `id`, probing on first use.
    ///
    /// Probe errors and panics both count as "unavailable".
    pub fn is_available(&self, id: AlgorithmId, backend: &dyn RawBlockCipher) -> bool {
        let kind = backend.kind();
        let slot = self.slot(id, kind);
        *slot.get_or_init(|| run_probe(id, backend))
    }

    /// Record that `kind` cannot serve `id` after all, whatever its probe said
    pub fn mark_unavailable(&self, id: AlgorithmId, kind: BackendKind) {
        self.slots
            .lock()
            .insert((id, kind), Arc::new(OnceCell::with_value(false)));
    }

    /// Number of (algorithm, backend) pairs with a settled answer
    pub fn len(&self) -> usize {
        self.slots.lock().values().filter(|s| s.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn run_probe(id: AlgorithmId, backend: &dyn RawBlockCipher) -> bool {
    let kind = backend.kind();
    if !backend.supports(id) {
        tracing::debug!(algorithm = %id, backend = %kind, "backend does not support algorithm");
        return false;
    }

    match catch_unwind(AssertUnwindSafe(|| backend.probe(id))) {
        Ok(Ok(())) => {
            tracing::debug!(algorithm = %id, backend = %kind, "probe succeeded");
            true
        }
        Ok(Err(e)) => {
            tracing::debug!(algorithm = %id, backend = %kind, error = %e, "probe failed");
            false
        }
        Err(_) => {
            tracing::warn!(algorithm = %id, backend = %kind, "probe panicked");
            false
        }
    }
}

impl core::fmt::Debug for AvailabilityCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AvailabilityCache")
            .field("settled", &self.len())
            .finish()
    }
}

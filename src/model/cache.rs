use super::{ModelProfile, Segmenter, SegmenterBackend};
use crate::error::ModelError;
use std::sync::{Arc, Mutex, PoisonError};

/// Lazily loads and caches exactly one segmenter per cache instance.
///
/// The slot mutex is held for the duration of a load, so concurrent
/// first callers block on the same construction instead of starting
/// independent ones (single-flight). The cached handle is shared
/// read-only via `Arc`; [`cleanup`](Self::cleanup) drops the cache's
/// reference, and accelerator memory is released once the last
/// in-flight run drops its clone.
pub struct ModelCache {
    backend: Box<dyn SegmenterBackend>,
    slot: Mutex<Option<Arc<dyn Segmenter>>>,
}

impl ModelCache {
    pub fn new(backend: Box<dyn SegmenterBackend>) -> Self {
        Self {
            backend,
            slot: Mutex::new(None),
        }
    }

    /// Load the model now so the first pipeline run does not pay the
    /// load latency. Idempotent.
    pub fn preload(&self) -> Result<(), ModelError> {
        self.get().map(|_| ())
    }

    /// Return the cached segmenter, loading it on first use.
    ///
    /// The primary profile is tried first; on failure the conservative
    /// fallback profile is tried once before surfacing
    /// [`ModelError::LoadFailed`]. A failed load leaves the slot empty
    /// so a later call retries from scratch.
    pub(crate) fn get(&self) -> Result<Arc<dyn Segmenter>, ModelError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(segmenter) = slot.as_ref() {
            return Ok(Arc::clone(segmenter));
        }

        tracing::info!("Loading segmentation model (primary profile)");
        let loaded = match self.backend.load(&ModelProfile::PRIMARY) {
            Ok(segmenter) => segmenter,
            Err(primary) => {
                tracing::warn!(
                    "Primary model profile failed ({}), retrying with fallback profile",
                    primary
                );
                self.backend
                    .load(&ModelProfile::FALLBACK)
                    .map_err(|fallback| ModelError::LoadFailed {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    })?
            }
        };

        let segmenter: Arc<dyn Segmenter> = Arc::from(loaded);
        tracing::info!(
            "Segmentation model ready (input {}x{})",
            segmenter.input_size().0,
            segmenter.input_size().1
        );
        *slot = Some(Arc::clone(&segmenter));
        Ok(segmenter)
    }

    /// Drop the cached segmenter. The next [`get`](Self::get) reloads
    /// from scratch and pays full load latency again.
    pub fn cleanup(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            tracing::info!("Segmentation model released");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn acceleration_available(&self) -> bool {
        self.backend.acceleration_available()
    }
}

//! Deterministic in-memory chat surface implementing the shared
//! `surface_provider` contracts.
//!
//! This crate contains no UI automation or transport logic and is intended
//! for relay tests and local development runs.

use std::sync::{Arc, Mutex, MutexGuard};

use surface_provider::{BlockSource, SourceUnavailable, Transport, TransportError};

#[derive(Debug, Default)]
struct SurfaceState {
    blocks: Vec<String>,
    delivered: Vec<String>,
    unavailable: bool,
    reject_delivery: bool,
}

/// Scripted chat surface. Clones share the same underlying transcript, so one
/// handle can play the transport while another is polled as the block source.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl ScriptedSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a surface whose transcript already contains `blocks`.
    #[must_use]
    pub fn with_blocks(blocks: Vec<String>) -> Self {
        let surface = Self::new();
        lock_unpoisoned(&surface.state).blocks = blocks;
        surface
    }

    /// Appends one observed text block to the transcript.
    pub fn push_block(&self, block: impl Into<String>) {
        lock_unpoisoned(&self.state).blocks.push(block.into());
    }

    /// Wire texts accepted for delivery so far, in order.
    #[must_use]
    pub fn delivered(&self) -> Vec<String> {
        lock_unpoisoned(&self.state).delivered.clone()
    }

    /// Simulates the observed context disappearing (or recovering).
    pub fn set_unavailable(&self, unavailable: bool) {
        lock_unpoisoned(&self.state).unavailable = unavailable;
    }

    /// Makes subsequent deliveries fail until cleared.
    pub fn set_reject_delivery(&self, reject: bool) {
        lock_unpoisoned(&self.state).reject_delivery = reject;
    }
}

impl Transport for ScriptedSurface {
    fn deliver(&mut self, wire_text: &str) -> Result<(), TransportError> {
        let mut state = lock_unpoisoned(&self.state);
        if state.reject_delivery {
            return Err(TransportError::new("scripted delivery rejection"));
        }
        state.delivered.push(wire_text.to_string());
        Ok(())
    }
}

impl BlockSource for ScriptedSurface {
    fn block_count(&self) -> Result<usize, SourceUnavailable> {
        let state = lock_unpoisoned(&self.state);
        if state.unavailable {
            return Err(SourceUnavailable::new("scripted surface unavailable"));
        }
        Ok(state.blocks.len())
    }

    fn latest_block(&self) -> Result<Option<String>, SourceUnavailable> {
        let state = lock_unpoisoned(&self.state);
        if state.unavailable {
            return Err(SourceUnavailable::new("scripted surface unavailable"));
        }
        Ok(state.blocks.last().cloned())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

//! Generation concurrency controls.
//!
//! [`GenerationGate`] is the session-wide single slot: one
//! generation-class command may be outstanding across the whole shot
//! book at a time.  The permit is RAII so every exit path -- success,
//! collaborator failure, early return -- releases the slot.
//!
//! [`StopFlag`] is the cooperative stop control: it prevents *new*
//! generation-class work from being scheduled (batch loops check it
//! between items) but never aborts an in-flight call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-slot permit gating generation-class commands.
#[derive(Clone)]
pub struct GenerationGate {
    permits: Arc<Semaphore>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Claim the slot without waiting. `None` when a generation is
    /// already outstanding.
    pub fn try_begin(&self) -> Option<GenerationPermit> {
        self.permits
            .clone()
            .try_acquire_owned()
            .ok()
            .map(GenerationPermit)
    }

    /// Whether a generation is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the generation slot; dropping it releases the slot.
pub struct GenerationPermit(OwnedSemaphorePermit);

/// Cooperative stop control shared between the session and its caller.
#[derive(Clone, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask running batch work to stop scheduling further items.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Re-arm after a stop, allowing new batch work.
    pub fn clear(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

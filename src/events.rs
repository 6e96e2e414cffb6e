//! In-process event bus.
//!
//! The bus is a field on the ledger, not a process-wide static, so
//! there is no global mutable event emitter or singleton chain —
//! subscribers register through the owning ledger handle.

use crate::types::{ArtifactId, Contradiction};

/// A state change subscribers can observe, emitted synchronously on the
/// writer thread after the corresponding mutation has committed.
#[derive(Clone, Debug)]
pub enum LedgerEvent {
    BlockCommitted { index: u64, hash: String },
    ArtifactMinted { id: ArtifactId, block_index: u64 },
    ArtifactRejected { id: ArtifactId, reason: String },
    ContradictionRecorded { record: Contradiction },
    CheckpointCreated { id: String },
    RecoveryPerformed { strategy: String, outcome: String },
}

type Subscriber = Box<dyn Fn(&LedgerEvent) + Send + Sync>;

/// Synchronous publish/subscribe bus. Subscribers run inline with
/// `publish` and must not block or re-enter the writer path.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn subscribe(&mut self, handler: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.subscribers.push(Box::new(handler));
    }

    pub fn publish(&self, event: LedgerEvent) {
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }
}

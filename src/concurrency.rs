//! Small concurrency primitives shared by long-running operations.
//!
//! `tokio-util`'s `CancellationToken` would cover this, but it isn't
//! part of this crate's dependency set, so this is a minimal
//! hand-rolled equivalent backed by an `Arc<AtomicBool>`, using the
//! same flag-polling style as the rest of this crate's cancellable
//! loops (block sealing, chain validation, recovery passes).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable flag that lets one task request cancellation of
/// another cooperatively. Used by block sealing, chain validation, and
/// recovery passes, all of which poll it periodically rather than being
/// preempted.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_latches_once_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}

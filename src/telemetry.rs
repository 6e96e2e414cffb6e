//! Structured logging initialization: an `EnvFilter` read from
//! `RUST_LOG`, falling back to a sensible default when unset.

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber. Call once at process
/// startup; a second call is a no-op (the underlying `try_init` error is
/// swallowed since tests may call this more than once across a binary).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("evidence_ledger=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

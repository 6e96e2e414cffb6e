//! Prometheus-backed metrics and HTTP exporter: a typed metrics struct
//! registered into a `Registry`, plus an optional `hyper` exporter
//! gated by [`crate::config::MetricsConfig::enabled`].

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    body::Incoming, header, server::conn::http1, service::service_fn, Method, Request, Response,
    StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{self, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// Ledger-wide operational metrics.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Latency of sealing (mining) a single block, in seconds.
    pub block_seal_seconds: Histogram,
    /// Latency of a full-chain validation run, in seconds.
    pub validation_run_seconds: Histogram,
    /// Total artifacts minted across all batches.
    pub artifacts_minted: IntCounter,
    /// Total artifacts rejected across all batches (dedup, admission, or contradiction loss).
    pub artifacts_rejected: IntCounter,
    /// Total contradictions detected and resolved.
    pub contradictions_resolved: IntCounter,
    /// Total recovery runs performed, by outcome.
    pub recoveries_applied: IntCounter,
    pub recoveries_no_op: IntCounter,
}

impl LedgerMetrics {
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let block_seal_seconds = Histogram::with_opts(
            HistogramOpts::new("ledger_block_seal_seconds", "Time to seal (mine) a block, in seconds")
                .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
        )?;
        registry.register(Box::new(block_seal_seconds.clone()))?;

        let validation_run_seconds = Histogram::with_opts(HistogramOpts::new(
            "ledger_validation_run_seconds",
            "Time to run a full-chain validation audit, in seconds",
        ))?;
        registry.register(Box::new(validation_run_seconds.clone()))?;

        let artifacts_minted = IntCounter::with_opts(Opts::new(
            "ledger_artifacts_minted_total",
            "Total artifacts successfully minted",
        ))?;
        registry.register(Box::new(artifacts_minted.clone()))?;

        let artifacts_rejected = IntCounter::with_opts(Opts::new(
            "ledger_artifacts_rejected_total",
            "Total artifacts rejected during minting",
        ))?;
        registry.register(Box::new(artifacts_rejected.clone()))?;

        let contradictions_resolved = IntCounter::with_opts(Opts::new(
            "ledger_contradictions_resolved_total",
            "Total contradictions detected and resolved",
        ))?;
        registry.register(Box::new(contradictions_resolved.clone()))?;

        let recoveries_applied = IntCounter::with_opts(Opts::new(
            "ledger_recoveries_applied_total",
            "Total recovery runs that swapped in a repaired chain",
        ))?;
        registry.register(Box::new(recoveries_applied.clone()))?;

        let recoveries_no_op = IntCounter::with_opts(Opts::new(
            "ledger_recoveries_no_op_total",
            "Total recovery runs that found no safe fix",
        ))?;
        registry.register(Box::new(recoveries_no_op.clone()))?;

        Ok(Self {
            block_seal_seconds,
            validation_run_seconds,
            artifacts_minted,
            artifacts_rejected,
            contradictions_resolved,
            recoveries_applied,
            recoveries_no_op,
        })
    }
}

/// Owns a Prometheus registry and the ledger metrics. Clone and share
/// across threads via `Arc`.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("evidence_ledger".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            eprintln!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs the `/metrics` HTTP exporter. Intended to be spawned onto a Tokio
/// runtime when [`crate::config::MetricsConfig::enabled`] is set.
pub async fn run_metrics_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                eprintln!("metrics HTTP server error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn ledger_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = LedgerMetrics::register(&registry).expect("register metrics");

        metrics.block_seal_seconds.observe(0.02);
        metrics.artifacts_minted.inc();
        metrics.contradictions_resolved.inc_by(2);

        let metric_families = registry.gather();
        assert!(!metric_families.is_empty());
    }

    #[test]
    fn metrics_registry_gather_text_includes_names() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry.ledger.artifacts_minted.inc();
        let text = registry.gather_text();
        assert!(text.contains("ledger_artifacts_minted_total"));
    }
}

//! Prometheus metrics for the card pipeline.
//!
//! Counters are recorded through the `metrics` facade wherever the event
//! happens; nothing is exported unless a recorder is installed with
//! [`init_metrics`] or [`try_init_metrics`].
//!
//! ```rust,ignore
//! use tapcard_core::metrics::{init_metrics, start_metrics_server};
//!
//! let handle = init_metrics();
//! start_metrics_server(9091, handle).await?;
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: `tapcard_`
//! - Suffix: `_total` for counters
//! - Labels: only bounded sets (`field`, `encoding`)

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Cards published through `create`.
pub const CARDS_CREATED: &str = "tapcard_cards_created_total";
/// Cards overwritten through `update`.
pub const CARDS_UPDATED: &str = "tapcard_cards_updated_total";
/// `remove` calls, including ones for missing cards.
pub const CARDS_REMOVED: &str = "tapcard_cards_removed_total";
/// Rejected submissions, labelled by `field`.
pub const VALIDATION_FAILURES: &str = "tapcard_validation_failures_total";
/// Rendered pages served from the cache.
pub const RENDER_CACHE_HITS: &str = "tapcard_render_cache_hits_total";
/// Rendered pages produced from scratch.
pub const RENDER_CACHE_MISSES: &str = "tapcard_render_cache_misses_total";
/// Canonical URLs that could not be encoded, labelled by `encoding`.
pub const ENCODING_FAILURES: &str = "tapcard_encoding_failures_total";

/// Initialize the Prometheus metrics recorder.
///
/// Must be called once at startup before any metrics are recorded.
///
/// # Panics
///
/// Panics if a recorder is already installed.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    register_metrics();

    handle
}

/// Like [`init_metrics`] but returns `None` if a recorder is already installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Serve `GET /metrics` on `port` in a background task.
///
/// Binding happens before this returns, so a taken port is reported to the
/// caller rather than lost inside the task.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

fn register_metrics() {
    describe_counter!(CARDS_CREATED, "Cards published");
    describe_counter!(CARDS_UPDATED, "Published cards overwritten with a new profile");
    describe_counter!(CARDS_REMOVED, "Card removal requests (idempotent)");
    describe_counter!(
        VALIDATION_FAILURES,
        "Profile submissions rejected by validation (label: field)"
    );
    describe_counter!(RENDER_CACHE_HITS, "Card pages served from the render cache");
    describe_counter!(RENDER_CACHE_MISSES, "Card pages rendered from the stored profile");
    describe_counter!(
        ENCODING_FAILURES,
        "Canonical URLs that exceeded an encoding's capacity (label: encoding)"
    );
}

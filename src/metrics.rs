use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("poll_cycles_total", "Poll cycles started.");
        describe_counter!(
            "poll_cycles_skipped_total",
            "Triggers dropped because a cycle was already running."
        );
        describe_counter!(
            "poll_fetch_failures_total",
            "Cycles that ended in a fetch failure (validator dropped)."
        );
        describe_counter!("feed_not_modified_total", "304 responses from the feed.");
        describe_counter!("feed_errors_total", "Feed transport/status/parse errors.");
        describe_counter!("feed_events_total", "Features parsed from feed payloads.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("alerts_emitted_total", "Alert records produced by the policy.");
        describe_gauge!("dedup_tracked_ids", "Ids currently held by the dedup tracker.");
        describe_counter!("notify_sent_total", "Alerts delivered to a notifier.");
        describe_counter!("notify_errors_total", "Alert deliveries that failed.");
        describe_counter!(
            "notify_lookup_errors_total",
            "Runs where a notifier could not resolve its target."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

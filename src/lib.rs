// src/lib.rs
// Public library surface for the service binary, the CLI and integration tests.

pub mod alert;
pub mod api;
pub mod config;
pub mod dedup;
pub mod feed;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod policy;
pub mod scheduler;

// ---- Re-exports for stable public API ----
pub use crate::alert::AlertRecord;
pub use crate::api::router;
pub use crate::notify::{AlertMessage, Notifier, NotifierMux};
pub use crate::orchestrator::Orchestrator;

use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::feed::HttpFeedClient;

/// Wire the live USGS client, the policy file and the orchestrator from config.
pub fn build_orchestrator(cfg: &AppConfig) -> Result<Orchestrator> {
    let policy = policy::load_policy_default()?;
    tracing::info!(
        threshold = policy.magnitude_threshold,
        region = %policy.region.name,
        feed = %cfg.feed.url,
        "alert policy loaded"
    );
    let feed = HttpFeedClient::from_config(&cfg.feed)?;
    Ok(Orchestrator::new(
        Arc::new(feed),
        policy,
        cfg.feed.fetch_timeout,
    ))
}

//! quake-watch — Binary Entrypoint
//! Boots the poll scheduler and the Axum liveness/command server.

use std::sync::Arc;

use anyhow::Context;
use quake_watch::api::{self, AppState};
use quake_watch::config::AppConfig;
use quake_watch::metrics::Metrics;
use quake_watch::notify::NotifierMux;
use quake_watch::scheduler::spawn_poll_scheduler;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact fmt logs filtered by RUST_LOG. Shuttle may already have installed a
/// global subscriber, in which case this is a no-op.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quake_watch=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env();
    let metrics = Metrics::init()?;

    let orchestrator = Arc::new(
        quake_watch::build_orchestrator(&cfg).context("building poll orchestrator")?,
    );
    let notifier = Arc::new(
        NotifierMux::from_env(cfg.alert_utc_offset_hours).context("configuring notifiers")?,
    );

    spawn_poll_scheduler(orchestrator.clone(), notifier.clone(), cfg.poll_interval);
    tracing::info!(
        period_secs = cfg.poll_interval.as_secs(),
        "earthquake poll scheduler started"
    );

    let state = AppState {
        orchestrator,
        notifier,
    };
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}

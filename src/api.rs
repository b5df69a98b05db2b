use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::notify::NotifierMux;
use crate::orchestrator::{Orchestrator, PollSnapshot, ValidationState};
use crate::scheduler::{check_and_dispatch, CheckStatus};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<NotifierMux>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Earthquake Bot is active!" }))
        .route("/health", get(|| async { "OK" }))
        .route("/check", post(check_now))
        .route("/debug/state", get(debug_state))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Alias kept for callers that expect `crate_root::router`.
pub fn router(state: AppState) -> Router {
    create_router(state)
}

#[derive(serde::Serialize)]
struct CheckResp {
    status: CheckStatus,
    alerts: usize,
    delivered: usize,
    failed: usize,
    message: String,
}

/// On-demand "check now": same path as the timer, answered synchronously.
async fn check_now(State(state): State<AppState>) -> Json<CheckResp> {
    let report = check_and_dispatch(&state.orchestrator, &state.notifier).await;
    Json(CheckResp {
        status: report.status,
        alerts: report.alerts,
        delivered: report.delivery.sent,
        failed: report.delivery.failed,
        message: report.message(),
    })
}

#[derive(serde::Serialize)]
struct StateOut {
    validation: ValidationState,
    tracked_ids: usize,
    #[serde(flatten)]
    snapshot: PollSnapshot,
    channels: Vec<&'static str>,
}

async fn debug_state(State(state): State<AppState>) -> Json<StateOut> {
    let snapshot = state.orchestrator.snapshot().await;
    let validation = if snapshot.validator.is_some() {
        ValidationState::Validated
    } else {
        ValidationState::Unvalidated
    };
    Json(StateOut {
        validation,
        tracked_ids: snapshot.notified.len(),
        snapshot,
        channels: state.notifier.channel_names(),
    })
}

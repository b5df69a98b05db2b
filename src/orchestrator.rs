//! # Poll Cycle Orchestrator
//! Owns the dedup tracker and the ETag validator, and runs one fetch ->
//! dedup -> policy pass per trigger. Triggers (timer tick or `/check`) go
//! through `try_run_cycle`; if a cycle is already in flight the newcomer is
//! dropped, never interleaved.
//!
//! Validator states:
//! - `Unvalidated` (initial, and after any failure): next fetch is unconditional.
//! - `Validated`: next fetch sends `If-None-Match`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::alert::AlertRecord;
use crate::dedup::DedupTracker;
use crate::feed::{FeedError, FeedSource, FetchOutcome};
use crate::metrics::ensure_metrics_described;
use crate::policy::AlertPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationState {
    Unvalidated,
    Validated,
}

#[derive(Debug, Default)]
struct PollState {
    tracker: DedupTracker,
    validator: Option<String>,
    cycles_run: u64,
    last_cycle_at: Option<DateTime<Utc>>,
}

/// Point-in-time copy of the orchestrator state, for `/debug/state` and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSnapshot {
    pub validator: Option<String>,
    pub notified: Vec<String>,
    pub cycles_run: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

pub struct Orchestrator {
    feed: Arc<dyn FeedSource>,
    policy: AlertPolicy,
    fetch_timeout: Duration,
    state: Mutex<PollState>,
}

impl Orchestrator {
    pub fn new(feed: Arc<dyn FeedSource>, policy: AlertPolicy, fetch_timeout: Duration) -> Self {
        ensure_metrics_described();
        Self {
            feed,
            policy,
            fetch_timeout,
            state: Mutex::new(PollState::default()),
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Run one cycle; a trigger that lands while another cycle holds the gate
    /// yields an empty batch.
    pub async fn run_cycle(&self) -> Vec<AlertRecord> {
        self.try_run_cycle().await.unwrap_or_default()
    }

    /// `None` when a cycle is already in progress.
    pub async fn try_run_cycle(&self) -> Option<Vec<AlertRecord>> {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::debug!(target: "poll", "cycle already in progress; trigger skipped");
            counter!("poll_cycles_skipped_total").increment(1);
            return None;
        };
        Some(self.cycle_locked(&mut state).await)
    }

    async fn cycle_locked(&self, state: &mut PollState) -> Vec<AlertRecord> {
        counter!("poll_cycles_total").increment(1);
        state.cycles_run += 1;
        state.last_cycle_at = Some(Utc::now());

        let outcome = match tokio::time::timeout(
            self.fetch_timeout,
            self.feed.fetch(state.validator.as_deref()),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Failure(FeedError::Timeout(self.fetch_timeout)),
        };

        let (events, validator) = match outcome {
            FetchOutcome::Unchanged => {
                tracing::trace!(target: "poll", feed = self.feed.name(), "feed not modified");
                return Vec::new();
            }
            FetchOutcome::Failure(e) => {
                tracing::warn!(target: "poll", feed = self.feed.name(), error = %e,
                    "fetch failed; dropping validator");
                counter!("poll_fetch_failures_total").increment(1);
                state.validator = None;
                return Vec::new();
            }
            FetchOutcome::Payload { events, validator } => (events, validator),
        };

        state.validator = validator;

        let novel = state.tracker.filter_novel(&events);
        let mut alerts = Vec::new();
        for ev in novel {
            let verdict = self.policy.evaluate(ev);
            if !verdict.qualifies {
                continue;
            }
            alerts.push(AlertRecord::from_event(ev, verdict.is_local_region));
            state.tracker.mark(&ev.id);
        }

        gauge!("dedup_tracked_ids").set(state.tracker.len() as f64);
        counter!("alerts_emitted_total").increment(alerts.len() as u64);
        tracing::info!(
            target: "poll",
            feed_events = events.len(),
            alerts = alerts.len(),
            tracked = state.tracker.len(),
            "poll cycle done"
        );
        alerts
    }

    pub async fn validation_state(&self) -> ValidationState {
        if self.state.lock().await.validator.is_some() {
            ValidationState::Validated
        } else {
            ValidationState::Unvalidated
        }
    }

    /// Waits for any in-flight cycle to finish.
    pub async fn snapshot(&self) -> PollSnapshot {
        let s = self.state.lock().await;
        PollSnapshot {
            validator: s.validator.clone(),
            notified: s.tracker.ids(),
            cycles_run: s.cycles_run,
            last_cycle_at: s.last_cycle_at,
        }
    }
}

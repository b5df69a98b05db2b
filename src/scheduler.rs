// src/scheduler.rs
//! Both triggers (the fixed-period timer and the `/check` command) end up in
//! `check_and_dispatch`; the orchestrator's gate decides who runs.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::notify::{DeliveryReport, NotifierMux};
use crate::orchestrator::Orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub alerts: usize,
    pub delivery: DeliveryReport,
}

impl CheckReport {
    pub fn message(&self) -> String {
        match (self.status, self.alerts) {
            (CheckStatus::Busy, _) => "An earthquake check is already in progress.".to_string(),
            (CheckStatus::Ok, 0) => "No new earthquake alerts found.".to_string(),
            (CheckStatus::Ok, n) => format!("Found {n} new alerts."),
        }
    }
}

/// Run one cycle and deliver whatever it produced. Never fails; problems are logged.
pub async fn check_and_dispatch(orch: &Orchestrator, mux: &NotifierMux) -> CheckReport {
    let Some(alerts) = orch.try_run_cycle().await else {
        return CheckReport {
            status: CheckStatus::Busy,
            alerts: 0,
            delivery: DeliveryReport::default(),
        };
    };

    let delivery = if alerts.is_empty() {
        DeliveryReport::default()
    } else {
        tracing::info!(target: "poll", count = alerts.len(), "alert triggered; dispatching");
        mux.notify_all(&alerts).await
    };

    CheckReport {
        status: CheckStatus::Ok,
        alerts: alerts.len(),
        delivery,
    }
}

/// Spawn the recurring poll. Ticks that land while a cycle is still running
/// (e.g. an on-demand check) are skipped rather than queued.
pub fn spawn_poll_scheduler(
    orch: Arc<Orchestrator>,
    mux: Arc<NotifierMux>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            tracing::debug!(target: "poll", "running scheduled earthquake check");
            let report = check_and_dispatch(&orch, &mux).await;
            if report.status == CheckStatus::Busy {
                tracing::debug!(target: "poll", "scheduled tick skipped; check in progress");
            } else if report.delivery.failed > 0 || report.delivery.lookup_failures > 0 {
                tracing::warn!(
                    target: "poll",
                    alerts = report.alerts,
                    sent = report.delivery.sent,
                    failed = report.delivery.failed,
                    lookup_failures = report.delivery.lookup_failures,
                    "scheduled check finished with delivery problems"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_command_replies() {
        let mut r = CheckReport {
            status: CheckStatus::Ok,
            alerts: 0,
            delivery: DeliveryReport::default(),
        };
        assert_eq!(r.message(), "No new earthquake alerts found.");
        r.alerts = 3;
        assert_eq!(r.message(), "Found 3 new alerts.");
        r.status = CheckStatus::Busy;
        assert!(r.message().contains("already in progress"));
    }
}

// src/notify/mod.rs
//! Outbound alert delivery. Best-effort: a failed send is logged and counted,
//! the rest of the batch still goes out, and dedup marks are never rolled back.

pub mod discord;
pub mod email;
pub mod slack;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use metrics::counter;

use crate::alert::AlertRecord;

/// Magnitude at or above which an alert is rendered as urgent (red).
pub const URGENT_MAGNITUDE: f64 = 5.0;
pub const COLOR_URGENT: u32 = 0xFF0000;
pub const COLOR_WARNING: u32 = 0xFFA500;
pub const FOOTER: &str = "USGS Earthquake Data";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Configured target (channel, mailbox) can't be found; stop delivering this run.
    #[error("delivery target not resolvable: {0}")]
    Lookup(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Channel-neutral rendering of one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub alert_id: String,
    pub title: String,
    pub url: String,
    pub place: String,
    pub local_time: String,
    pub description: String,
    pub color: u32,
    pub urgent: bool,
    pub timestamp_iso: String,
    pub footer: String,
}

impl AlertMessage {
    pub fn from_alert(alert: &AlertRecord, offset: FixedOffset) -> Self {
        let urgent = alert.magnitude.is_some_and(|m| m >= URGENT_MAGNITUDE);
        let emoji = if urgent { "🚨" } else { "⚠️" };
        let mag = match alert.magnitude {
            Some(m) => format!("{m:.1}"),
            None => "?".to_string(),
        };
        let local_time = alert
            .occurred_at
            .with_timezone(&offset)
            .format("%-d/%-m/%Y %H:%M:%S (UTC%:z)")
            .to_string();
        let description = format!(
            "**Location:** {}\n**Time:** {}\n[View on Map]({})",
            alert.place, local_time, alert.detail_url
        );

        Self {
            alert_id: alert.id.clone(),
            title: format!("{emoji} Earthquake Alert: M {mag}"),
            url: alert.detail_url.clone(),
            place: alert.place.clone(),
            local_time,
            description,
            color: if urgent { COLOR_URGENT } else { COLOR_WARNING },
            urgent,
            timestamp_iso: alert.occurred_at.to_rfc3339(),
            footer: FOOTER.to_string(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check the delivery target exists before a batch. Default: nothing to resolve.
    async fn resolve_target(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send(&self, msg: &AlertMessage) -> Result<(), NotifyError>;
}

/// Fallback when no channel is configured: alerts only reach the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, msg: &AlertMessage) -> Result<(), NotifyError> {
        tracing::info!(target: "notify", id = %msg.alert_id, place = %msg.place, "{}", msg.title);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub lookup_failures: usize,
}

impl DeliveryReport {
    fn absorb(&mut self, other: DeliveryReport) {
        self.sent += other.sent;
        self.failed += other.failed;
        self.lookup_failures += other.lookup_failures;
    }
}

/// Deliver `msgs` in order to one notifier.
pub async fn deliver_batch(notifier: &dyn Notifier, msgs: &[AlertMessage]) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    if msgs.is_empty() {
        return report;
    }

    if let Err(e) = notifier.resolve_target().await {
        tracing::error!(target: "notify", notifier = notifier.name(), error = %e,
            skipped = msgs.len(), "delivery target lookup failed; aborting batch");
        counter!("notify_lookup_errors_total").increment(1);
        report.lookup_failures = 1;
        return report;
    }

    for msg in msgs {
        match notifier.send(msg).await {
            Ok(()) => {
                counter!("notify_sent_total").increment(1);
                report.sent += 1;
            }
            Err(e) => {
                tracing::warn!(target: "notify", notifier = notifier.name(),
                    id = %msg.alert_id, error = %e, "alert delivery failed");
                counter!("notify_errors_total").increment(1);
                report.failed += 1;
            }
        }
    }
    report
}

/// Fans a batch out to every configured notifier.
#[derive(Clone)]
pub struct NotifierMux {
    notifiers: Vec<Arc<dyn Notifier>>,
    offset: FixedOffset,
}

impl NotifierMux {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>, utc_offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        Self { notifiers, offset }
    }

    /// Enable each channel whose credentials are present; log-only if none are.
    pub fn from_env(utc_offset_hours: i32) -> anyhow::Result<Self> {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
        if let Some(d) = discord::DiscordNotifier::from_env() {
            notifiers.push(Arc::new(d));
        }
        if let Some(s) = slack::SlackNotifier::from_env() {
            notifiers.push(Arc::new(s));
        }
        if let Some(e) = email::EmailSender::from_env()? {
            notifiers.push(Arc::new(e));
        }
        if notifiers.is_empty() {
            tracing::warn!(target: "notify", "no notification channel configured; alerts go to the log only");
            notifiers.push(Arc::new(LogNotifier));
        }
        let names: Vec<&str> = notifiers.iter().map(|n| n.name()).collect();
        tracing::info!(target: "notify", channels = ?names, "notifiers ready");
        Ok(Self::new(notifiers, utc_offset_hours))
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    pub fn render(&self, alerts: &[AlertRecord]) -> Vec<AlertMessage> {
        alerts
            .iter()
            .map(|a| AlertMessage::from_alert(a, self.offset))
            .collect()
    }

    pub async fn notify_all(&self, alerts: &[AlertRecord]) -> DeliveryReport {
        let msgs = self.render(alerts);
        let mut total = DeliveryReport::default();
        for n in &self.notifiers {
            total.absorb(deliver_batch(n.as_ref(), &msgs).await);
        }
        total
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{AlertMessage, Notifier, NotifyError};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn from_env() -> Option<Self> {
        std::env::var("SLACK_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }

    /// Optional builder for tests/tools
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

/// Slack mrkdwn has no `**bold**` or `[text](url)`; render our own text.
fn slack_text(msg: &AlertMessage) -> String {
    let mut text = format!(
        "*{}*\n*Location:* {}\n*Time:* {}",
        msg.title, msg.place, msg.local_time
    );
    if !msg.url.is_empty() {
        text.push_str(&format!("\n<{}|View on Map>", msg.url));
    }
    text
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, msg: &AlertMessage) -> Result<(), NotifyError> {
        let body = serde_json::json!({ "text": slack_text(msg) });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(format!("slack post: {e}")))?
            .error_for_status()
            .map_err(|e| NotifyError::Delivery(format!("slack non-2xx: {e}")))?;
        Ok(())
    }
}

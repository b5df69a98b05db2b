use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{AlertMessage, Notifier, NotifyError};

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Posts embeds to a guild channel through the bot REST API.
pub struct DiscordNotifier {
    token: String,
    channel_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
    resolved: AtomicBool,
}

impl DiscordNotifier {
    pub fn new(token: String, channel_id: String) -> Self {
        Self {
            token,
            channel_id,
            api_base: DISCORD_API.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
            resolved: AtomicBool::new(false),
        }
    }

    /// `DISCORD_TOKEN` + `NEWS_CHANNEL_ID`; `None` if either is missing.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("DISCORD_TOKEN").ok().filter(|s| !s.trim().is_empty())?;
        let channel = std::env::var("NEWS_CHANNEL_ID").ok().filter(|s| !s.trim().is_empty())?;
        Some(Self::new(token, channel.trim().to_string()))
    }

    /// Point at a different API root (tests, proxies).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.api_base, self.channel_id)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn resolve_target(&self) -> Result<(), NotifyError> {
        if self.resolved.load(Ordering::Relaxed) {
            return Ok(());
        }
        let rsp = self
            .client
            .get(self.channel_url())
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| NotifyError::Lookup(format!("channel {}: {e}", self.channel_id)))?;

        if !rsp.status().is_success() {
            return Err(NotifyError::Lookup(format!(
                "channel {}: HTTP {}",
                self.channel_id,
                rsp.status()
            )));
        }
        self.resolved.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn send(&self, msg: &AlertMessage) -> Result<(), NotifyError> {
        let payload = DiscordMessagePayload::embed(msg);
        let url = format!("{}/messages", self.channel_url());

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .header(reqwest::header::AUTHORIZATION, self.auth())
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    let Err(e) = rsp.error_for_status_ref() else {
                        return Ok(());
                    };
                    let status = rsp.status();
                    if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
                        // channel vanished or bot lost access mid-run
                        self.resolved.store(false, Ordering::Relaxed);
                    }
                    let transient =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !transient || attempt >= self.max_retries {
                        return Err(NotifyError::Delivery(format!("Discord HTTP error: {e}")));
                    }
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(NotifyError::Delivery(format!(
                            "Discord request failed: {e}"
                        )));
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[derive(Serialize)]
struct DiscordFooter {
    text: String,
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    url: String,
    description: String,
    color: u32,
    timestamp: String,
    footer: DiscordFooter,
}

#[derive(Serialize)]
struct DiscordMessagePayload {
    embeds: Vec<DiscordEmbed>,
}

impl DiscordMessagePayload {
    fn embed(msg: &AlertMessage) -> Self {
        Self {
            embeds: vec![DiscordEmbed {
                title: msg.title.clone(),
                url: msg.url.clone(),
                description: msg.description.clone(),
                color: msg.color,
                timestamp: msg.timestamp_iso.clone(),
                footer: DiscordFooter {
                    text: msg.footer.clone(),
                },
            }],
        }
    }
}

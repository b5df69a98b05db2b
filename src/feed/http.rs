// src/feed/http.rs
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};

use crate::config::FeedConfig;
use crate::feed::geojson::parse_feed;
use crate::feed::types::{FeedError, FeedSource, FetchOutcome};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Conditional GET against the USGS summary feed. Exactly one request per call,
/// no retries.
#[derive(Clone)]
pub struct HttpFeedClient {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpFeedClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::build(url.into(), DEFAULT_FETCH_TIMEOUT, false)
    }

    pub fn from_config(cfg: &FeedConfig) -> Result<Self> {
        Self::build(cfg.url.clone(), cfg.fetch_timeout, cfg.prefer_ipv4)
    }

    fn build(url: String, timeout: Duration, prefer_ipv4: bool) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("quake-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout);
        if prefer_ipv4 {
            // Binding the v4 wildcard keeps the connector off AAAA records.
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
        let client = builder.build().context("building feed http client")?;
        Ok(Self {
            url,
            client,
            timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_transport(&self, e: reqwest::Error) -> FeedError {
        if e.is_timeout() {
            FeedError::Timeout(self.timeout)
        } else {
            FeedError::Transport(e.to_string())
        }
    }

    async fn fetch_inner(&self, validator: Option<&str>) -> Result<FetchOutcome, FeedError> {
        let mut req = self.client.get(&self.url).timeout(self.timeout);
        if let Some(v) = validator {
            req = req.header(IF_NONE_MATCH, v);
        }

        let resp = req.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();

        if status == StatusCode::NOT_MODIFIED {
            counter!("feed_not_modified_total").increment(1);
            return Ok(FetchOutcome::Unchanged);
        }
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let new_validator = resp
            .headers()
            .get(ETAG)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        let events = parse_feed(&body)?;

        Ok(FetchOutcome::Payload {
            events,
            validator: new_validator,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    async fn fetch(&self, validator: Option<&str>) -> FetchOutcome {
        match self.fetch_inner(validator).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(target: "feed", error = %e, url = %self.url, "feed fetch failed");
                counter!("feed_errors_total").increment(1);
                FetchOutcome::Failure(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "usgs"
    }
}

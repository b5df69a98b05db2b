// src/feed/types.rs
use std::time::Duration;

pub const UNKNOWN_PLACE: &str = "Unknown Location";

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
    pub depth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeedEvent {
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: String,
    pub coordinates: Option<Coordinates>,
    pub occurred_at_ms: i64, // epoch millis, as published by the feed
    pub detail_url: String,
    pub title: String,
}

/// Transient fetch failures. None of these are fatal; the orchestrator drops
/// its validator and waits for the next tick.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed transport error: {0}")]
    Transport(String),
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),
    #[error("feed returned HTTP {0}")]
    Status(u16),
    #[error("feed payload malformed: {0}")]
    Malformed(String),
}

#[derive(Debug)]
pub enum FetchOutcome {
    /// Server answered 304 for the validator we sent.
    Unchanged,
    Payload {
        events: Vec<FeedEvent>,
        validator: Option<String>,
    },
    Failure(FeedError),
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, validator: Option<&str>) -> FetchOutcome;
    fn name(&self) -> &'static str;
}

// src/alert.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::feed::{Coordinates, FeedEvent};

/// One qualifying event, handed to the notifiers and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub id: String,
    pub title: String,
    pub magnitude: Option<f64>,
    pub place: String,
    pub occurred_at: DateTime<Utc>,
    pub detail_url: String,
    pub is_local_region: bool,
    pub coordinates: Option<Coordinates>,
}

impl AlertRecord {
    pub fn from_event(ev: &FeedEvent, is_local_region: bool) -> Self {
        // out-of-range millis fall back to the epoch rather than dropping the alert
        let occurred_at = Utc
            .timestamp_millis_opt(ev.occurred_at_ms)
            .single()
            .unwrap_or_default();
        Self {
            id: ev.id.clone(),
            title: ev.title.clone(),
            magnitude: ev.magnitude,
            place: ev.place.clone(),
            occurred_at,
            detail_url: ev.detail_url.clone(),
            is_local_region,
            coordinates: ev.coordinates,
        }
    }
}

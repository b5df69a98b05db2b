// src/feed/mod.rs
pub mod geojson;
pub mod http;
pub mod scripted;
pub mod types;

pub use geojson::parse_feed;
pub use http::HttpFeedClient;
pub use scripted::{ScriptedFeed, Step};
pub use types::{Coordinates, FeedError, FeedEvent, FeedSource, FetchOutcome, UNKNOWN_PLACE};

pub const USGS_ALL_HOUR_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_hour.geojson";

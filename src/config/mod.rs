// src/config/mod.rs
//! Process configuration read from the environment (after `.env` is loaded).
//! Channel credentials are read by the individual notifiers.

use std::time::Duration;

use crate::feed::USGS_ALL_HOUR_URL;

pub const ENV_FEED_URL: &str = "QUAKE_FEED_URL";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_PREFER_IPV4: &str = "FEED_PREFER_IPV4";
pub const ENV_ALERT_UTC_OFFSET_HOURS: &str = "ALERT_UTC_OFFSET_HOURS";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
// Alerts are read in Bangkok time by default.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: String,
    pub fetch_timeout: Duration,
    pub prefer_ipv4: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub poll_interval: Duration,
    pub alert_utc_offset_hours: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; unknown or unparsable values fall back to defaults.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str, default: u64| -> u64 {
            get(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
                .max(1) // tokio::time::interval panics on zero
        };

        let url = get(ENV_FEED_URL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| USGS_ALL_HOUR_URL.to_string());

        let prefer_ipv4 = get(ENV_PREFER_IPV4)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        let alert_utc_offset_hours = get(ENV_ALERT_UTC_OFFSET_HOURS)
            .and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|h| (-12..=14).contains(h))
            .unwrap_or(DEFAULT_UTC_OFFSET_HOURS);

        Self {
            feed: FeedConfig {
                url,
                fetch_timeout: Duration::from_secs(secs(
                    ENV_FETCH_TIMEOUT_SECS,
                    DEFAULT_FETCH_TIMEOUT_SECS,
                )),
                prefer_ipv4,
            },
            poll_interval: Duration::from_secs(secs(
                ENV_POLL_INTERVAL_SECS,
                DEFAULT_POLL_INTERVAL_SECS,
            )),
            alert_utc_offset_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let c = AppConfig::default();
        assert_eq!(c.feed.url, USGS_ALL_HOUR_URL);
        assert_eq!(c.poll_interval, Duration::from_secs(60));
        assert_eq!(c.feed.fetch_timeout, Duration::from_secs(10));
        assert!(c.feed.prefer_ipv4);
        assert_eq!(c.alert_utc_offset_hours, 7);
    }

    #[test]
    fn overrides_and_garbage() {
        let c = AppConfig::from_lookup(lookup(&[
            (ENV_FEED_URL, " http://localhost:9000/feed "),
            (ENV_POLL_INTERVAL_SECS, "0"),
            (ENV_FETCH_TIMEOUT_SECS, "abc"),
            (ENV_PREFER_IPV4, "false"),
            (ENV_ALERT_UTC_OFFSET_HOURS, "99"),
        ]));
        assert_eq!(c.feed.url, "http://localhost:9000/feed");
        assert_eq!(c.poll_interval, Duration::from_secs(1));
        assert_eq!(c.feed.fetch_timeout, Duration::from_secs(10));
        assert!(!c.feed.prefer_ipv4);
        assert_eq!(c.alert_utc_offset_hours, 7);
    }
}

//! dedup.rs — tracks which feed ids were already alerted on.
//!
//! Memory is bounded by the feed window itself: any id that drops out of the
//! current listing is forgotten on the next successful poll. There is no TTL.

use std::collections::HashSet;

use crate::feed::FeedEvent;

#[derive(Debug, Default, Clone)]
pub struct DedupTracker {
    notified: HashSet<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict every tracked id not present in `current_ids`. Returns how many were dropped.
    pub fn prune(&mut self, current_ids: &HashSet<&str>) -> usize {
        let before = self.notified.len();
        self.notified.retain(|id| current_ids.contains(id.as_str()));
        before - self.notified.len()
    }

    /// Prune against `current_feed`, then return the events not yet notified,
    /// in feed order. Does not mark anything.
    pub fn filter_novel<'a>(&mut self, current_feed: &'a [FeedEvent]) -> Vec<&'a FeedEvent> {
        let current_ids: HashSet<&str> = current_feed.iter().map(|e| e.id.as_str()).collect();
        let evicted = self.prune(&current_ids);
        if evicted > 0 {
            tracing::debug!(target: "poll", evicted, "pruned ids that left the feed window");
        }

        current_feed
            .iter()
            .filter(|e| !self.notified.contains(&e.id))
            .collect()
    }

    /// Returns false if the id was already tracked.
    pub fn mark(&mut self, id: &str) -> bool {
        self.notified.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notified.contains(id)
    }

    pub fn len(&self) -> usize {
        self.notified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
    }

    /// Sorted copy of the tracked ids.
    pub fn ids(&self) -> Vec<String> {
        let mut v: Vec<String> = self.notified.iter().cloned().collect();
        v.sort();
        v
    }
}

// src/feed/scripted.rs
//! In-process feed that replays queued responses. Used by tests and the
//! `check_once --fixture` mode; records every validator it was asked with.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::feed::geojson::parse_feed;
use crate::feed::types::{FeedError, FeedEvent, FeedSource, FetchOutcome};

#[derive(Debug, Clone)]
pub enum Step {
    Events {
        events: Vec<FeedEvent>,
        validator: Option<String>,
    },
    /// Raw GeoJSON body; parsed on fetch so malformed fixtures surface as failures.
    Body {
        json: String,
        validator: Option<String>,
    },
    NotModified,
    Fail(String),
    /// Sleep before answering `NotModified`; used to simulate a hung upstream.
    Stall(Duration),
}

#[derive(Default)]
pub struct ScriptedFeed {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<Option<String>>>,
}

fn relock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, step: Step) -> &Self {
        relock(&self.steps).push_back(step);
        self
    }

    pub fn push_events(&self, events: Vec<FeedEvent>, validator: Option<&str>) -> &Self {
        self.push(Step::Events {
            events,
            validator: validator.map(str::to_string),
        })
    }

    pub fn push_body(&self, json: &str, validator: Option<&str>) -> &Self {
        self.push(Step::Body {
            json: json.to_string(),
            validator: validator.map(str::to_string),
        })
    }

    /// Validators passed to each `fetch` call, in call order.
    pub fn validators_seen(&self) -> Vec<Option<String>> {
        relock(&self.seen).clone()
    }

    pub fn remaining(&self) -> usize {
        relock(&self.steps).len()
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self, validator: Option<&str>) -> FetchOutcome {
        relock(&self.seen).push(validator.map(str::to_string));
        let step = relock(&self.steps).pop_front();

        match step {
            None | Some(Step::NotModified) => FetchOutcome::Unchanged,
            Some(Step::Events { events, validator }) => FetchOutcome::Payload { events, validator },
            Some(Step::Body { json, validator }) => match parse_feed(&json) {
                Ok(events) => FetchOutcome::Payload { events, validator },
                Err(e) => FetchOutcome::Failure(e),
            },
            Some(Step::Fail(reason)) => FetchOutcome::Failure(FeedError::Transport(reason)),
            Some(Step::Stall(d)) => {
                tokio::time::sleep(d).await;
                FetchOutcome::Unchanged
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// tests/cycle_e2e.rs
//
// Poll-cycle behaviour end to end, driven by an in-process scripted feed.

use std::sync::Arc;
use std::time::Duration;

use quake_watch::feed::{Coordinates, FeedEvent, ScriptedFeed, Step};
use quake_watch::orchestrator::ValidationState;
use quake_watch::policy::AlertPolicy;
use quake_watch::Orchestrator;

fn event(id: &str, mag: Option<f64>, lat: f64, lon: f64, place: &str) -> FeedEvent {
    FeedEvent {
        id: id.into(),
        magnitude: mag,
        place: place.into(),
        coordinates: Some(Coordinates {
            longitude: lon,
            latitude: lat,
            depth: Some(10.0),
        }),
        occurred_at_ms: 1_743_142_852_000,
        detail_url: format!("https://earthquake.usgs.gov/earthquakes/eventpage/{id}"),
        title: format!("M {} - {}", mag.unwrap_or_default(), place),
    }
}

fn a() -> FeedEvent {
    event("A", Some(6.1), 36.2, 140.1, "Honshu, Japan")
}
fn b() -> FeedEvent {
    event("B", Some(3.0), 10.0, 100.0, "Bangkok, Thailand")
}
fn c() -> FeedEvent {
    event("C", Some(2.0), 48.85, 2.35, "Paris, France")
}
fn d() -> FeedEvent {
    event("D", Some(5.0), -18.0, 178.0, "Fiji")
}

fn orchestrator(feed: Arc<ScriptedFeed>) -> Orchestrator {
    Orchestrator::new(feed, AlertPolicy::default(), Duration::from_secs(2))
}

#[tokio::test]
async fn scenario_major_regional_then_quiet() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_events(vec![a(), b(), c()], Some("\"e1\""))
        .push_events(vec![a(), b(), c()], Some("\"e2\""))
        .push_events(vec![b(), c(), d()], Some("\"e3\""));
    let orch = orchestrator(feed.clone());

    let first = orch.run_cycle().await;
    let ids: Vec<&str> = first.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert!(!first[0].is_local_region);
    assert!(first[1].is_local_region);
    assert_eq!(first[0].place, "Honshu, Japan");
    assert_eq!(first[0].occurred_at.timestamp_millis(), 1_743_142_852_000);

    assert!(orch.run_cycle().await.is_empty(), "same feed must not re-alert");

    // A left the window, D sits exactly on the threshold
    assert!(orch.run_cycle().await.is_empty());
    let snap = orch.snapshot().await;
    assert_eq!(snap.notified, vec!["B".to_string()]);
    assert_eq!(snap.validator.as_deref(), Some("\"e3\""));
}

#[tokio::test]
async fn evicted_id_is_novel_when_it_reappears() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_events(vec![a()], None)
        .push_events(vec![c()], None)
        .push_events(vec![a(), c()], None);
    let orch = orchestrator(feed);

    assert_eq!(orch.run_cycle().await.len(), 1);
    assert!(orch.run_cycle().await.is_empty());
    assert!(orch.snapshot().await.notified.is_empty());

    let again = orch.run_cycle().await;
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].id, "A");
}

#[tokio::test]
async fn not_modified_leaves_state_alone() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_events(vec![a(), b()], Some("\"v1\""))
        .push(Step::NotModified);
    let orch = orchestrator(feed.clone());

    orch.run_cycle().await;
    let before = orch.snapshot().await;

    assert!(orch.run_cycle().await.is_empty());
    let after = orch.snapshot().await;
    assert_eq!(after.notified, before.notified);
    assert_eq!(after.validator.as_deref(), Some("\"v1\""));
    assert_eq!(
        feed.validators_seen(),
        vec![None, Some("\"v1\"".to_string())]
    );
}

#[tokio::test]
async fn failure_drops_validator_for_next_fetch() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_events(vec![b()], Some("\"v1\""))
        .push(Step::Fail("connection reset".into()))
        .push_events(vec![b()], Some("\"v2\""));
    let orch = orchestrator(feed.clone());

    assert_eq!(orch.run_cycle().await.len(), 1);
    assert_eq!(orch.validation_state().await, ValidationState::Validated);

    assert!(orch.run_cycle().await.is_empty());
    assert_eq!(orch.validation_state().await, ValidationState::Unvalidated);
    // the tracker survives a failed fetch
    assert_eq!(orch.snapshot().await.notified, vec!["B".to_string()]);

    assert!(orch.run_cycle().await.is_empty());
    assert_eq!(
        feed.validators_seen(),
        vec![None, Some("\"v1\"".to_string()), None]
    );
}

#[tokio::test]
async fn malformed_payload_counts_as_failure() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_events(vec![c()], Some("\"v1\""))
        .push_body("{\"type\": \"FeatureCollection\", \"features\": [", Some("\"v2\""));
    let orch = orchestrator(feed);

    orch.run_cycle().await;
    assert!(orch.run_cycle().await.is_empty());
    assert_eq!(orch.snapshot().await.validator, None);
}

#[tokio::test]
async fn fixture_document_yields_major_and_local() {
    let body = include_str!("fixtures/all_hour.geojson");
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_body(body, Some("\"fixture\""));
    let orch = orchestrator(feed);

    let alerts = orch.run_cycle().await;
    let got: Vec<(&str, bool)> = alerts
        .iter()
        .map(|r| (r.id.as_str(), r.is_local_region))
        .collect();
    assert_eq!(got, vec![("us7000pn9s", false), ("us7000pnaa", true)]);
}

#[tokio::test]
async fn stalled_fetch_is_cut_off_by_timeout() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push_events(vec![a()], Some("\"v1\""))
        .push(Step::Stall(Duration::from_secs(30)));
    let orch = Orchestrator::new(
        feed.clone(),
        AlertPolicy::default(),
        Duration::from_millis(100),
    );

    orch.run_cycle().await;
    let started = std::time::Instant::now();
    assert!(orch.run_cycle().await.is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(orch.validation_state().await, ValidationState::Unvalidated);
}

#[tokio::test]
async fn overlapping_trigger_is_dropped() {
    let feed = Arc::new(ScriptedFeed::new());
    feed.push(Step::Stall(Duration::from_millis(400)));
    let orch = Arc::new(orchestrator(feed.clone()));

    let in_flight = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.try_run_cycle().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(orch.try_run_cycle().await.is_none(), "second trigger must be skipped");
    assert!(orch.run_cycle().await.is_empty());

    let first = in_flight.await.expect("join");
    assert_eq!(first, Some(Vec::new()));
    // only the in-flight cycle reached the feed
    assert_eq!(feed.validators_seen().len(), 1);
    assert_eq!(orch.snapshot().await.cycles_run, 1);
}

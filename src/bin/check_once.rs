//! One poll cycle from the command line; prints alerts instead of delivering them.
//!
//! `check_once`                   -> live feed ($QUAKE_FEED_URL or USGS all_hour)
//! `check_once --fixture <file>`  -> replay a saved GeoJSON document

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use quake_watch::config::AppConfig;
use quake_watch::feed::ScriptedFeed;
use quake_watch::notify::AlertMessage;
use quake_watch::policy::load_policy_default;
use quake_watch::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = AppConfig::from_env();
    let mut args = std::env::args().skip(1);

    let orch = match (args.next().as_deref(), args.next()) {
        (None, _) => quake_watch::build_orchestrator(&cfg)?,
        (Some("--fixture"), Some(path)) => {
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("reading fixture {path}"))?;
            let feed = ScriptedFeed::new();
            feed.push_body(&body, None);
            Orchestrator::new(Arc::new(feed), load_policy_default()?, cfg.feed.fetch_timeout)
        }
        _ => bail!("usage: check_once [--fixture <geojson-file>]"),
    };

    let alerts = orch.run_cycle().await;
    let offset = chrono::FixedOffset::east_opt(cfg.alert_utc_offset_hours * 3600)
        .context("invalid ALERT_UTC_OFFSET_HOURS")?;

    for a in &alerts {
        let msg = AlertMessage::from_alert(a, offset);
        println!(
            "{}  [{}]{}\n  {}\n  {}",
            msg.title,
            a.id,
            if a.is_local_region { " (local)" } else { "" },
            msg.place,
            msg.local_time
        );
    }
    println!("{} alert(s)", alerts.len());
    Ok(())
}

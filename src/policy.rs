// src/policy.rs
//! Alert policy: which novel events are worth a notification.
//!
//! An event qualifies if ANY of these holds:
//! - magnitude strictly above the global threshold,
//! - epicentre inside the regional lat/lon box (inclusive bounds),
//! - the place text mentions the region name (case-insensitive).
//!
//! `is_local_region` is the box OR name result, independent of magnitude.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::feed::FeedEvent;

pub const ENV_POLICY_PATH: &str = "QUAKE_POLICY_PATH";
pub const DEFAULT_POLICY_PATH: &str = "config/policy.toml";

fn default_magnitude_threshold() -> f64 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionBox {
    pub name: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for RegionBox {
    fn default() -> Self {
        Self {
            name: "thailand".to_string(),
            lat_min: 5.6,
            lat_max: 20.5,
            lon_min: 97.3,
            lon_max: 105.7,
        }
    }
}

impl RegionBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&latitude)
            && (self.lon_min..=self.lon_max).contains(&longitude)
    }

    pub fn matches_name(&self, place: &str) -> bool {
        let needle = self.name.trim().to_lowercase();
        !needle.is_empty() && place.to_lowercase().contains(&needle)
    }

    fn sanitize(&mut self) {
        if self.lat_min > self.lat_max {
            std::mem::swap(&mut self.lat_min, &mut self.lat_max);
        }
        if self.lon_min > self.lon_max {
            std::mem::swap(&mut self.lon_min, &mut self.lon_max);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    #[serde(default = "default_magnitude_threshold")]
    pub magnitude_threshold: f64,
    #[serde(default)]
    pub region: RegionBox,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            magnitude_threshold: default_magnitude_threshold(),
            region: RegionBox::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyVerdict {
    pub qualifies: bool,
    pub is_local_region: bool,
}

impl AlertPolicy {
    pub fn evaluate(&self, ev: &FeedEvent) -> PolicyVerdict {
        // absent magnitude never clears the bar
        let is_global_major = ev
            .magnitude
            .is_some_and(|m| m > self.magnitude_threshold);

        let in_box = ev
            .coordinates
            .is_some_and(|c| self.region.contains(c.latitude, c.longitude));
        let by_name = self.region.matches_name(&ev.place);
        let is_local_region = in_box || by_name;

        PolicyVerdict {
            qualifies: is_global_major || is_local_region,
            is_local_region,
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut p: AlertPolicy = toml::from_str(s).context("parsing policy toml")?;
        if !p.magnitude_threshold.is_finite() {
            return Err(anyhow!("magnitude_threshold must be a finite number"));
        }
        p.region.sanitize();
        Ok(p)
    }
}

pub fn load_policy_from(path: &Path) -> Result<AlertPolicy> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading policy from {}", path.display()))?;
    AlertPolicy::from_toml_str(&content)
}

/// Load policy using env var + fallbacks:
/// 1) $QUAKE_POLICY_PATH
/// 2) config/policy.toml
/// 3) built-in defaults
pub fn load_policy_default() -> Result<AlertPolicy> {
    if let Ok(p) = std::env::var(ENV_POLICY_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_policy_from(&pb);
        } else {
            return Err(anyhow!("QUAKE_POLICY_PATH points to non-existent path"));
        }
    }
    let default_p = PathBuf::from(DEFAULT_POLICY_PATH);
    if default_p.exists() {
        return load_policy_from(&default_p);
    }
    Ok(AlertPolicy::default())
}

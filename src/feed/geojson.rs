// src/feed/geojson.rs
//! USGS GeoJSON summary format -> `FeedEvent`.

use metrics::{counter, histogram};
use serde::Deserialize;

use crate::feed::types::{Coordinates, FeedError, FeedEvent, UNKNOWN_PLACE};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: Properties,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    mag: Option<f64>,
    #[serde(default)]
    place: Option<String>,
    time: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // [lon, lat, depth]
    #[serde(default)]
    coordinates: Vec<Option<f64>>,
}

impl Geometry {
    fn to_coordinates(&self) -> Option<Coordinates> {
        let longitude = self.coordinates.first().copied().flatten()?;
        let latitude = self.coordinates.get(1).copied().flatten()?;
        Some(Coordinates {
            longitude,
            latitude,
            depth: self.coordinates.get(2).copied().flatten(),
        })
    }
}

/// Parse a feed document, preserving feature order.
pub fn parse_feed(body: &str) -> Result<Vec<FeedEvent>, FeedError> {
    let t0 = std::time::Instant::now();
    let doc: FeatureCollection =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let out: Vec<FeedEvent> = doc
        .features
        .into_iter()
        .map(|f| {
            let coordinates = f.geometry.as_ref().and_then(Geometry::to_coordinates);
            let p = f.properties;
            FeedEvent {
                id: f.id,
                magnitude: p.mag,
                place: p
                    .place
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_PLACE.to_string()),
                coordinates,
                occurred_at_ms: p.time,
                detail_url: p.url.unwrap_or_default(),
                title: p.title.unwrap_or_default(),
            }
        })
        .collect();

    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("feed_events_total").increment(out.len() as u64);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_features_in_order_with_defaults() {
        let body = r#"{
          "type": "FeatureCollection",
          "features": [
            {"id": "us1", "properties": {"mag": 4.2, "place": "10 km N of Chiang Rai, Thailand",
              "time": 1700000000000, "title": "M 4.2 - Chiang Rai", "url": "https://x/us1"},
             "geometry": {"type": "Point", "coordinates": [99.8, 19.9, 10.0]}},
            {"id": "ak2", "properties": {"mag": null, "place": null, "time": 1700000001000},
             "geometry": null}
          ]
        }"#;
        let evs = parse_feed(body).unwrap();
        assert_eq!(evs.len(), 2);
        assert_eq!(evs[0].id, "us1");
        assert_eq!(evs[0].magnitude, Some(4.2));
        let c = evs[0].coordinates.unwrap();
        assert_eq!((c.longitude, c.latitude, c.depth), (99.8, 19.9, Some(10.0)));

        assert_eq!(evs[1].magnitude, None);
        assert_eq!(evs[1].place, UNKNOWN_PLACE);
        assert!(evs[1].coordinates.is_none());
        assert_eq!(evs[1].title, "");
    }

    #[test]
    fn missing_features_array_is_malformed() {
        let err = parse_feed(r#"{"type":"FeatureCollection"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }
}

//! Append-only telemetry history, plus the synthetic demo fallback.
//!
//! Each ingest appends one immutable record under
//! `history:{device_id}:{timestamp}`. Timestamps are rendered as RFC 3339
//! with fixed-width microsecond precision, so the store's lexicographic
//! prefix scan returns records in chronological order with no sort step.
//!
//! When a device has no recorded history (or a dashboard asks for a longer
//! window than exists) the history endpoint serves a synthesized hourly
//! series instead. The response envelope's `source` field keeps the two
//! unmistakably apart: synthetic points are demo data and are never
//! persisted.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Map, Value};

// ---

/// Longest window a synthetic series is generated for, in days. Requests
/// beyond it are clamped rather than allocating unbounded point vectors.
pub const MAX_WINDOW_DAYS: u32 = 365;

/// Storage key for one history record. Microsecond precision keeps two
/// ingests landing within the same millisecond on distinct keys.
pub fn history_key(device_id: &str, timestamp: DateTime<Utc>) -> String {
    // ---
    format!(
        "history:{}:{}",
        device_id,
        timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    )
}

/// Key prefix scanning all of one device's history.
pub fn history_prefix(device_id: &str) -> String {
    format!("history:{device_id}:")
}

/// One immutable telemetry snapshot: the reported sample plus the
/// server-side ingestion timestamp, flattened to the original wire shape.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    // ---
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub sample: Map<String, Value>,
}

impl HistoryRecord {
    // ---

    /// Snapshot a reported sample at `timestamp`.
    ///
    /// `sample` must serialize to a JSON object (any of the patch types
    /// do); a non-object sample yields an empty snapshot.
    pub fn new<T: Serialize>(sample: &T, timestamp: DateTime<Utc>) -> Self {
        // ---
        let sample = match serde_json::to_value(sample) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        HistoryRecord { timestamp, sample }
    }
}

/// Where a history series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    /// Records actually ingested and stored.
    Recorded,
    /// Placeholder series generated for demo dashboards; never persisted.
    Synthetic,
}

/// Response envelope for a history query.
#[derive(Debug, Serialize)]
pub struct HistorySeries {
    // ---
    pub source: HistorySource,
    pub points: Vec<Value>,
}

/// Generate the hourly placeholder series for a `days`-long window.
///
/// Values hover around a typical ripening run: ~18 °C supply air, ~90% RH,
/// with an ethylene spike over the last 20 points, elevated CO2 over the
/// last 40, and the occasional alarm tick.
pub fn synthetic_series(days: u32) -> Vec<Value> {
    // ---
    let mut rng = rand::thread_rng();
    let hours = days.clamp(1, MAX_WINDOW_DAYS) * 24;
    let now = Utc::now();

    (0..hours)
        .map(|i| {
            let timestamp = now - Duration::hours((hours - 1 - i) as i64);
            let ethylene = if i + 20 > hours {
                100.0 + rng.gen_range(0.0..20.0)
            } else {
                10.0
            };
            let co2_reading = if i + 40 > hours {
                2.0 + rng.gen_range(0.0..1.0)
            } else {
                0.5
            };

            json!({
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                "temp_supply_1": 18.0 + rng.gen_range(-1.0..1.0),
                "return_air": 18.5 + rng.gen_range(-1.0..1.0),
                "relative_humidity": 90.0 + rng.gen_range(-2.5..2.5),
                "ethylene": ethylene,
                "co2_reading": co2_reading,
                "set_point": 18.0,
                "alarm_present": if rng.gen_bool(0.05) { 1 } else { 0 },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::TelemetryPatch;
    use chrono::TimeZone;

    #[test]
    fn keys_sort_chronologically() {
        // ---
        let early = Utc.with_ymd_and_hms(2026, 3, 10, 9, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();

        let k1 = history_key("ZGRU5140008", early);
        let k2 = history_key("ZGRU5140008", late);
        assert!(k1 < k2);
        assert!(k1.starts_with(&history_prefix("ZGRU5140008")));
    }

    #[test]
    fn key_timestamps_are_fixed_width() {
        // ---
        // Whole-second instants still render .000000 so widths never vary
        let ts = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        let key = history_key("D1", ts);
        assert!(
            key.ends_with("2026-03-10T10:00:00.000000Z"),
            "key was {key}"
        );
    }

    #[test]
    fn sub_millisecond_ingests_get_distinct_keys() {
        // ---
        // Back-to-back ingests inside one millisecond must not share a
        // key, or the later record would silently replace the earlier one
        let ts = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        let k1 = history_key("D1", ts);
        let k2 = history_key("D1", ts + Duration::microseconds(1));

        assert_ne!(k1, k2);
        assert!(k1 < k2);
    }

    #[test]
    fn record_flattens_sample_beside_timestamp() {
        // ---
        let patch: TelemetryPatch =
            serde_json::from_str(r#"{"temp_supply_1": 18.0, "power_state": 1}"#).unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();

        let json = serde_json::to_value(HistoryRecord::new(&patch, ts)).unwrap();
        assert_eq!(json["temp_supply_1"], 18.0);
        assert_eq!(json["power_state"], 1);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn synthetic_series_is_hourly_per_day() {
        // ---
        assert_eq!(synthetic_series(1).len(), 24);
        assert_eq!(synthetic_series(7).len(), 168);
        // A zero-day request still produces one day's worth
        assert_eq!(synthetic_series(0).len(), 24);
    }

    #[test]
    fn oversized_window_is_clamped() {
        // ---
        // Day counts near u32::MAX must not overflow the hour arithmetic
        // or allocate a series longer than the ceiling allows
        let ceiling = (MAX_WINDOW_DAYS * 24) as usize;
        assert_eq!(synthetic_series(u32::MAX).len(), ceiling);
        assert_eq!(synthetic_series(178_956_971).len(), ceiling);
        assert_eq!(synthetic_series(MAX_WINDOW_DAYS).len(), ceiling);
    }

    #[test]
    fn synthetic_points_carry_the_telemetry_shape() {
        // ---
        let points = synthetic_series(1);
        let first = &points[0];
        let last = &points[23];

        for point in [first, last] {
            assert!(point["timestamp"].is_string());
            assert!(point["temp_supply_1"].is_f64());
            assert_eq!(point["set_point"], 18.0);
        }

        // Ethylene ramps at the tail of the window
        assert!(last["ethylene"].as_f64().unwrap() >= 100.0);
        assert_eq!(first["ethylene"], 10.0);

        // Points are in ascending time order
        let t0 = first["timestamp"].as_str().unwrap();
        let t23 = last["timestamp"].as_str().unwrap();
        assert!(t0 < t23);
    }
}

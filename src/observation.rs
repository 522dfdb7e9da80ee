//! Traffic observations and the in-memory dataset built from them.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Timestamp layout used wherever an observation time is shown to a user.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One predicted vs. actual traffic count at a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub node_id: i64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub predicted: i64,
    #[serde(deserialize_with = "deserialize_count")]
    pub actual: i64,
}

impl Observation {
    /// Absolute prediction error, `|actual - predicted|`.
    pub fn absolute_error(&self) -> u64 {
        self.actual.abs_diff(self.predicted)
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Parses the timestamp layouts found in prediction exports.
///
/// RFC 3339 values are converted to UTC before the offset is dropped, and a
/// bare date is read as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a vehicle count. Float text is truncated toward zero.
///
/// Counts are never negative, and float text must fit in an `i64`.
pub fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let count = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v < i64::MAX as f64)
            .map(|v| v.trunc() as i64)?,
    };
    (count >= 0).then_some(count)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_count(&raw).ok_or_else(|| de::Error::custom(format!("invalid count `{raw}`")))
}

/// A node's fixed position, as shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeLocation {
    pub node_id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// All loaded observations, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    observations: Vec<Observation>,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Unique node ids in order of first appearance.
    pub fn node_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .map(|o| o.node_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn contains_node(&self, node_id: i64) -> bool {
        self.observations.iter().any(|o| o.node_id == node_id)
    }

    /// Observations for one node, in file order.
    pub fn for_node(&self, node_id: i64) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|o| o.node_id == node_id)
            .collect()
    }

    /// Distinct `(node_id, lat, lon)` triples in order of first appearance.
    ///
    /// A node whose coordinates drift between rows shows up once per
    /// distinct position.
    pub fn node_locations(&self) -> Vec<NodeLocation> {
        let mut seen = HashSet::new();
        self.observations
            .iter()
            .filter(|o| seen.insert((o.node_id, o.lat.to_bits(), o.lon.to_bits())))
            .map(|o| NodeLocation {
                node_id: o.node_id,
                lat: o.lat,
                lon: o.lon,
            })
            .collect()
    }
}

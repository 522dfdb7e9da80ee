//! View models for the node inspection dashboard.
//!
//! Everything a front end needs to draw one node: the map layer with the
//! selected node highlighted, the predicted vs. actual series, the anomaly
//! report and a short error summary. Nothing here renders; the types are
//! plain serializable data.

use chrono::NaiveDateTime;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExplainError;
use crate::explainer::{AnomalyReport, explain_observation};
use crate::observation::Dataset;
use crate::selector::select_anomaly;
use crate::stats::{NodeSummary, mean};

pub const SELECTED_COLOR: [u8; 4] = [255, 0, 0, 200];
pub const DEFAULT_COLOR: [u8; 4] = [0, 128, 255, 150];
pub const SELECTED_RADIUS: u32 = 150;
pub const DEFAULT_RADIUS: u32 = 100;
pub const DEFAULT_ZOOM: f64 = 12.0;
pub const DEFAULT_PITCH: f64 = 50.0;

/// A node marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub node_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub color: [u8; 4],
    pub radius: u32,
    pub selected: bool,
}

/// Initial camera for the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayer {
    pub view_state: ViewState,
    pub points: Vec<MapPoint>,
}

/// One point of the predicted vs. actual line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub predicted: i64,
    pub actual: i64,
}

/// Everything shown for a selected node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub title: String,
    pub node_id: i64,
    pub nodes: Vec<i64>,
    pub map: MapLayer,
    pub series: Vec<SeriesPoint>,
    pub summary: NodeSummary,
    pub report: AnomalyReport,
}

/// Resolves the node to inspect, defaulting to the first node in the dataset.
///
/// # Errors
///
/// Returns [`ExplainError::UnknownNode`] when `requested` is not in the
/// dataset, and [`ExplainError::EmptySeries`] when the dataset is empty.
pub fn resolve_node(dataset: &Dataset, requested: Option<i64>) -> Result<i64, ExplainError> {
    match requested {
        Some(node_id) if dataset.contains_node(node_id) => Ok(node_id),
        Some(node_id) => Err(ExplainError::UnknownNode { node_id }),
        None => dataset
            .observations()
            .first()
            .map(|o| o.node_id)
            .ok_or(ExplainError::EmptySeries),
    }
}

pub fn title(node_id: i64) -> String {
    format!("UrbanGuard: Traffic Analysis for Node {node_id}")
}

/// Builds the scatter layer for every known node location.
///
/// The camera centres on the mean of the plotted coordinates.
pub fn map_layer(dataset: &Dataset, selected: i64) -> MapLayer {
    let points: Vec<MapPoint> = dataset
        .node_locations()
        .into_iter()
        .map(|loc| {
            let selected = loc.node_id == selected;
            MapPoint {
                node_id: loc.node_id,
                lat: loc.lat,
                lon: loc.lon,
                color: if selected { SELECTED_COLOR } else { DEFAULT_COLOR },
                radius: if selected { SELECTED_RADIUS } else { DEFAULT_RADIUS },
                selected,
            }
        })
        .collect();

    let lats: Vec<f64> = points.iter().map(|p| p.lat).collect();
    let lons: Vec<f64> = points.iter().map(|p| p.lon).collect();

    MapLayer {
        view_state: ViewState {
            latitude: mean(&lats),
            longitude: mean(&lons),
            zoom: DEFAULT_ZOOM,
            pitch: DEFAULT_PITCH,
        },
        points,
    }
}

pub fn series(dataset: &Dataset, node_id: i64) -> Vec<SeriesPoint> {
    dataset
        .for_node(node_id)
        .into_iter()
        .map(|o| SeriesPoint {
            timestamp: o.timestamp,
            predicted: o.predicted,
            actual: o.actual,
        })
        .collect()
}

/// Selects the node's largest anomaly and explains it.
#[tracing::instrument(skip(dataset, rng))]
pub fn node_report<R>(dataset: &Dataset, node_id: i64, rng: &mut R) -> Result<AnomalyReport, ExplainError>
where
    R: Rng + ?Sized,
{
    let rows = dataset.for_node(node_id);
    let anomaly = select_anomaly(rows.iter().copied())?;
    debug!(
        timestamp = %anomaly.formatted_timestamp(),
        absolute_error = anomaly.absolute_error(),
        "Anomaly selected"
    );
    explain_observation(anomaly, rng)
}

pub fn node_summary(dataset: &Dataset, node_id: i64) -> NodeSummary {
    NodeSummary::from_observations(node_id, dataset.for_node(node_id))
}

/// Assembles the full dashboard for `requested` (or the first node).
#[tracing::instrument(skip(dataset, rng))]
pub fn snapshot<R>(
    dataset: &Dataset,
    requested: Option<i64>,
    rng: &mut R,
) -> Result<DashboardSnapshot, ExplainError>
where
    R: Rng + ?Sized,
{
    let node_id = resolve_node(dataset, requested)?;
    let report = node_report(dataset, node_id, rng)?;

    info!(node_id, severity = %report.severity, "Dashboard assembled");

    Ok(DashboardSnapshot {
        title: title(node_id),
        node_id,
        nodes: dataset.node_ids(),
        map: map_layer(dataset, node_id),
        series: series(dataset, node_id),
        summary: node_summary(dataset, node_id),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainer::Severity;
    use crate::observation::Observation;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn obs(node_id: i64, lat: f64, hour: u32, predicted: i64, actual: i64) -> Observation {
        Observation {
            node_id,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            lat,
            lon: 114.0,
            predicted,
            actual,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            obs(1, 22.0, 0, 100, 105),
            obs(2, 24.0, 0, 100, 90),
            obs(1, 22.0, 1, 100, 250),
            obs(2, 24.0, 1, 100, 160),
        ])
    }

    #[test]
    fn test_resolve_node_defaults_to_first() {
        assert_eq!(resolve_node(&dataset(), None), Ok(1));
        assert_eq!(resolve_node(&dataset(), Some(2)), Ok(2));
        assert_eq!(
            resolve_node(&dataset(), Some(9)),
            Err(ExplainError::UnknownNode { node_id: 9 })
        );
        assert_eq!(
            resolve_node(&Dataset::default(), None),
            Err(ExplainError::EmptySeries)
        );
    }

    #[test]
    fn test_map_highlights_only_selected() {
        let layer = map_layer(&dataset(), 2);
        assert_eq!(layer.points.len(), 2);

        let selected: Vec<_> = layer.points.iter().filter(|p| p.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].node_id, 2);
        assert_eq!(selected[0].color, SELECTED_COLOR);
        assert_eq!(selected[0].radius, SELECTED_RADIUS);

        let other = layer.points.iter().find(|p| p.node_id == 1).unwrap();
        assert_eq!(other.color, DEFAULT_COLOR);
        assert_eq!(other.radius, DEFAULT_RADIUS);
    }

    #[test]
    fn test_view_state_centres_on_mean() {
        let layer = map_layer(&dataset(), 1);
        assert_eq!(layer.view_state.latitude, 23.0);
        assert_eq!(layer.view_state.longitude, 114.0);
        assert_eq!(layer.view_state.zoom, DEFAULT_ZOOM);
        assert_eq!(layer.view_state.pitch, DEFAULT_PITCH);
    }

    #[test]
    fn test_series_for_node() {
        let s = series(&dataset(), 2);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].actual, 90);
        assert_eq!(s[1].actual, 160);
    }

    #[test]
    fn test_node_report_explains_largest_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let report = node_report(&dataset(), 1, &mut rng).unwrap();
        assert_eq!(report.actual, 250);
        assert_eq!(report.timestamp, "2024-03-01 01:00:00");
        assert_eq!(report.severity, Severity::CriticalAnomaly);
    }

    #[test]
    fn test_node_report_for_unknown_node_is_empty_series() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            node_report(&dataset(), 42, &mut rng),
            Err(ExplainError::EmptySeries)
        );
    }

    #[test]
    fn test_snapshot() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let snap = snapshot(&dataset(), Some(2), &mut rng).unwrap();

        assert_eq!(snap.title, "UrbanGuard: Traffic Analysis for Node 2");
        assert_eq!(snap.nodes, vec![1, 2]);
        assert_eq!(snap.series.len(), 2);
        assert_eq!(snap.summary.observations, 2);
        assert_eq!(snap.report.severity, Severity::SignificantSpike);
    }
}

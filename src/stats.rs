//! Per-node prediction error statistics.

use serde::Serialize;

use crate::observation::Observation;

/// Error summary for one node's prediction series.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node_id: i64,
    pub observations: usize,
    pub mean_predicted: f64,
    pub mean_actual: f64,
    pub mean_absolute_error: f64,
    pub absolute_error_stddev: f64,
    /// Mean absolute percentage error, skipping rows with a zero prediction.
    pub mape: f64,
    pub max_absolute_error: u64,
}

impl NodeSummary {
    pub fn from_observations<'a, I>(node_id: i64, observations: I) -> Self
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let mut predicted = Vec::new();
        let mut actual = Vec::new();
        let mut abs_errors = Vec::new();
        let mut pct_errors = Vec::new();
        let mut max_absolute_error = 0_u64;

        for obs in observations {
            max_absolute_error = max_absolute_error.max(obs.absolute_error());
            predicted.push(obs.predicted as f64);
            actual.push(obs.actual as f64);
            abs_errors.push(obs.absolute_error() as f64);

            if obs.predicted != 0 {
                pct_errors.push(Self::pct(obs.absolute_error() as f64, obs.predicted.unsigned_abs() as f64));
            }
        }

        let mean_absolute_error = mean(&abs_errors);

        NodeSummary {
            node_id,
            observations: abs_errors.len(),
            mean_predicted: mean(&predicted),
            mean_actual: mean(&actual),
            mean_absolute_error,
            absolute_error_stddev: stddev(&abs_errors, mean_absolute_error),
            mape: mean(&pct_errors),
            max_absolute_error,
        }
    }

    pub fn pct(part: f64, total: f64) -> f64 {
        if total == 0.0 {
            0.0
        } else {
            (part / total) * 100.0
        }
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

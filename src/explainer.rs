//! Templated situational reports for traffic anomalies.
//!
//! The report is a fixed sentence pair: a description of the raw input and an
//! explanation naming a severity bucket and one of [`CAUSES`]. The cause is
//! drawn from a caller-supplied [`Rng`] so that a seeded generator gives
//! reproducible reports.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::debug;

use crate::error::ExplainError;
use crate::observation::Observation;

/// Candidate causes interpolated into every explanation.
pub const CAUSES: [&str; 4] = [
    "a localized event (like a minor accident or a delivery truck blocking a lane)",
    "unexpected congestion due to a nearby road closure",
    "a public event in the vicinity",
    "sensor noise or a temporary sensor malfunction",
];

/// Coarse classification of how far the actual count overshot the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    #[serde(rename = "Anomaly")]
    Anomaly,
    #[serde(rename = "Significant Spike")]
    SignificantSpike,
    #[serde(rename = "Critical Anomaly")]
    CriticalAnomaly,
}

impl Severity {
    /// Buckets a percentage deviation. Both thresholds are strict.
    ///
    /// | Deviation | Severity          |
    /// |-----------|-------------------|
    /// | > 100     | Critical Anomaly  |
    /// | > 50      | Significant Spike |
    /// | otherwise | Anomaly           |
    pub fn classify(error_percentage: f64) -> Self {
        match error_percentage {
            p if p > 100.0 => Severity::CriticalAnomaly,
            p if p > 50.0 => Severity::SignificantSpike,
            _ => Severity::Anomaly,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Anomaly => "Anomaly",
            Severity::SignificantSpike => "Significant Spike",
            Severity::CriticalAnomaly => "Critical Anomaly",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Generated report for one anomalous observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub node_id: i64,
    pub timestamp: String,
    pub predicted: i64,
    pub actual: i64,
    pub error_percentage: f64,
    pub severity: Severity,
    pub cause: &'static str,
    pub input_description: String,
    pub explanation: String,
}

impl AnomalyReport {
    /// Error percentage rounded to a whole number, as shown in the explanation.
    pub fn rounded_percentage(&self) -> String {
        format!("{:.0}", self.error_percentage)
    }
}

/// Signed deviation of `actual` from `predicted`, as a percentage of `predicted`.
///
/// # Errors
///
/// Returns [`ExplainError::ZeroPrediction`] when `predicted` is zero.
pub fn error_percentage(node_id: i64, predicted: i64, actual: i64) -> Result<f64, ExplainError> {
    if predicted == 0 {
        return Err(ExplainError::ZeroPrediction { node_id });
    }
    Ok((actual as f64 - predicted as f64) / predicted as f64 * 100.0)
}

/// Builds the situational report for a single anomaly.
///
/// `timestamp` is embedded verbatim.
pub fn generate_report<R>(
    node_id: i64,
    timestamp: &str,
    predicted: i64,
    actual: i64,
    rng: &mut R,
) -> Result<AnomalyReport, ExplainError>
where
    R: Rng + ?Sized,
{
    let error_percentage = error_percentage(node_id, predicted, actual)?;
    let severity = Severity::classify(error_percentage);
    let cause = CAUSES.choose(rng).copied().unwrap_or(CAUSES[0]);

    debug!(
        node_id,
        error_percentage,
        severity = %severity,
        cause,
        "Generated situational report"
    );

    let input_description = format!(
        "At Node {node_id} at {timestamp}, the model predicted {predicted} vehicles, but {actual} were observed."
    );
    let explanation = format!(
        "{severity} detected at Node {node_id}. The {error_percentage:.0}% spike above the predicted flow suggests {cause}. The T-GCN model's spatial analysis should be reviewed to see if this is impacting adjacent nodes."
    );

    Ok(AnomalyReport {
        node_id,
        timestamp: timestamp.to_string(),
        predicted,
        actual,
        error_percentage,
        severity,
        cause,
        input_description,
        explanation,
    })
}

/// Reports on an observation, formatting its timestamp the way users see it.
pub fn explain_observation<R>(obs: &Observation, rng: &mut R) -> Result<AnomalyReport, ExplainError>
where
    R: Rng + ?Sized,
{
    generate_report(
        obs.node_id,
        &obs.formatted_timestamp(),
        obs.predicted,
        obs.actual,
        rng,
    )
}

//! Picks the observation that a node's report is written about.

use crate::error::ExplainError;
use crate::observation::Observation;

/// Returns the observation with the largest `|actual - predicted|`.
///
/// Ties resolve to the earliest observation in input order.
///
/// # Errors
///
/// Returns [`ExplainError::EmptySeries`] when `observations` is empty.
pub fn select_anomaly<'a, I>(observations: I) -> Result<&'a Observation, ExplainError>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut best: Option<&Observation> = None;

    for obs in observations {
        match best {
            Some(current) if obs.absolute_error() <= current.absolute_error() => {}
            _ => best = Some(obs),
        }
    }

    best.ok_or(ExplainError::EmptySeries)
}

//! Error types for loading predictions and explaining anomalies.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading the predictions table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The predictions file does not exist.
    #[error("`{}` not found", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed into an observation.
    #[error("malformed record in `{}`: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("`{}` contains no observations", path.display())]
    Empty { path: PathBuf },
}

/// Failures while selecting or explaining an anomaly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExplainError {
    /// Anomaly selection needs at least one observation.
    #[error("no observations to select an anomaly from")]
    EmptySeries,

    /// The percentage deviation is undefined for a zero prediction.
    #[error("node {node_id} has a predicted count of zero; percentage error is undefined")]
    ZeroPrediction { node_id: i64 },

    #[error("node {node_id} is not present in the dataset")]
    UnknownNode { node_id: i64 },
}

//! Reads the predictions table from disk.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::observation::{Dataset, Observation};

/// Loads every observation from a predictions CSV.
///
/// Files ending in `.gz` are decompressed on the fly. Columns are matched by
/// header name, so extra columns and any column order are accepted.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] when `path` does not exist, and
/// [`LoadError::Empty`] when the file has a header but no rows.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_observations(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(gzipped, "Opened predictions file");

    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let observations = read_observations(reader).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    if observations.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let dataset = Dataset::new(observations);
    info!(
        rows = dataset.len(),
        nodes = dataset.node_ids().len(),
        "Predictions loaded"
    );
    Ok(dataset)
}

/// Deserializes observations from any CSV source with a header row.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: Observation = result?;
        rows.push(record);
    }

    Ok(rows)
}

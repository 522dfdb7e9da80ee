//! Output formatting and persistence for dashboard views and reports.
//!
//! Supports plain-text rendering, JSON serialization, and CSV append of
//! generated reports.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::dashboard::{DashboardSnapshot, MapLayer, SeriesPoint};
use crate::explainer::{AnomalyReport, Severity};
use crate::observation::{NodeLocation, TIMESTAMP_FORMAT};
use crate::stats::NodeSummary;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// One row of the report log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub generated_at: DateTime<Utc>,
    pub node_id: i64,
    pub timestamp: String,
    pub predicted: i64,
    pub actual: i64,
    pub error_percentage: f64,
    pub severity: Severity,
    pub cause: String,
}

impl ReportRecord {
    pub fn from_report(report: &AnomalyReport) -> Self {
        ReportRecord {
            generated_at: Utc::now(),
            node_id: report.node_id,
            timestamp: report.timestamp.clone(),
            predicted: report.predicted,
            actual: report.actual,
            error_percentage: report.error_percentage,
            severity: report.severity,
            cause: report.cause.to_string(),
        }
    }
}

/// Writes any view as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_report<W: Write>(out: &mut W, report: &AnomalyReport) -> Result<()> {
    writeln!(out, "Anomaly Input:")?;
    writeln!(out, "  {}", report.input_description)?;
    writeln!(out)?;
    writeln!(out, "Agent Output:")?;
    writeln!(out, "  {}", report.explanation)?;
    Ok(())
}

pub fn write_nodes<W: Write>(out: &mut W, locations: &[NodeLocation]) -> Result<()> {
    writeln!(out, "{:>10}  {:>11}  {:>11}", "node_id", "lat", "lon")?;
    for loc in locations {
        writeln!(out, "{:>10}  {:>11.6}  {:>11.6}", loc.node_id, loc.lat, loc.lon)?;
    }
    Ok(())
}

pub fn write_series<W: Write>(out: &mut W, series: &[SeriesPoint]) -> Result<()> {
    writeln!(out, "{:<19}  {:>9}  {:>9}", "timestamp", "predicted", "actual")?;
    for point in series {
        writeln!(
            out,
            "{:<19}  {:>9}  {:>9}",
            point.timestamp.format(TIMESTAMP_FORMAT),
            point.predicted,
            point.actual
        )?;
    }
    Ok(())
}

pub fn write_map<W: Write>(out: &mut W, layer: &MapLayer) -> Result<()> {
    let view = &layer.view_state;
    writeln!(
        out,
        "View: lat {:.6}, lon {:.6}, zoom {}, pitch {}",
        view.latitude, view.longitude, view.zoom, view.pitch
    )?;
    for p in &layer.points {
        let marker = if p.selected { "*" } else { " " };
        writeln!(
            out,
            "{marker} node {:>8}  ({:.6}, {:.6})  radius {}",
            p.node_id, p.lat, p.lon, p.radius
        )?;
    }
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summary: &NodeSummary) -> Result<()> {
    writeln!(out, "Node {}", summary.node_id)?;
    writeln!(out, "  observations:        {}", summary.observations)?;
    writeln!(out, "  mean predicted:      {:.2}", summary.mean_predicted)?;
    writeln!(out, "  mean actual:         {:.2}", summary.mean_actual)?;
    writeln!(
        out,
        "  mean absolute error: {:.2} (sd {:.2})",
        summary.mean_absolute_error, summary.absolute_error_stddev
    )?;
    writeln!(out, "  MAPE:                {:.1}%", summary.mape)?;
    writeln!(out, "  max absolute error:  {}", summary.max_absolute_error)?;
    Ok(())
}

pub fn write_dashboard<W: Write>(out: &mut W, snapshot: &DashboardSnapshot) -> Result<()> {
    writeln!(out, "{}", snapshot.title)?;
    writeln!(out)?;
    writeln!(out, "Node Map")?;
    write_map(out, &snapshot.map)?;
    writeln!(out)?;
    writeln!(out, "Predicted vs. Actual Traffic Flow")?;
    write_series(out, &snapshot.series)?;
    writeln!(out)?;
    write_summary(out, &snapshot.summary)?;
    writeln!(out)?;
    writeln!(out, "Situational Report")?;
    write_report(out, &snapshot.report)
}

/// Appends a [`ReportRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &ReportRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending report record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainer::generate_report;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_report() -> AnomalyReport {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        generate_report(12, "2024-03-01 08:15:00", 100, 250, &mut rng).unwrap()
    }

    #[test]
    fn test_write_report_sections() {
        let report = sample_report();
        let mut buf = Vec::new();
        write_report(&mut buf, &report).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Anomaly Input:\n"));
        assert!(text.contains(&report.input_description));
        assert!(text.contains("Agent Output:"));
        assert!(text.contains(&report.explanation));
    }

    #[test]
    fn test_write_json_serializes_severity_label() {
        let report = sample_report();
        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["severity"], "Critical Anomaly");
        assert_eq!(value["node_id"], 12);
    }

    #[test]
    fn test_append_record_creates_file() {
        let path = temp_path("urbanguard_test_create.csv");
        let _ = fs::remove_file(&path);

        let record = ReportRecord::from_report(&sample_report());
        append_record(&path, &record).unwrap();

        assert!(Path::new(&path).exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Critical Anomaly"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("urbanguard_test_header.csv");
        let _ = fs::remove_file(&path);

        let record = ReportRecord::from_report(&sample_report());
        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content
            .lines()
            .filter(|l| l.starts_with("generated_at"))
            .count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use urbanguard::dashboard::{node_report, snapshot};
use urbanguard::error::LoadError;
use urbanguard::explainer::Severity;
use urbanguard::loader::load_observations;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/predictions.csv");

#[test]
fn test_full_pipeline() {
    let dataset = load_observations(Path::new(FIXTURE)).expect("Failed to load fixture");
    assert_eq!(dataset.node_ids(), vec![101, 202, 303]);

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let snap = snapshot(&dataset, None, &mut rng).expect("Failed to build dashboard");

    assert_eq!(snap.node_id, 101);
    assert_eq!(snap.map.points.len(), 3);
    assert_eq!(snap.series.len(), 4);
    assert_eq!(snap.report.actual, 310);
    assert_eq!(snap.report.timestamp, "2024-03-01 08:30:00");
    assert_eq!(snap.report.severity, Severity::CriticalAnomaly);
    assert!(snap.report.explanation.contains("Node 101"));
    assert!(snap.report.explanation.contains("121%"));
}

#[test]
fn test_reports_per_node() {
    let dataset = load_observations(Path::new(FIXTURE)).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    // 90 -> 140 is a 56% spike
    let r = node_report(&dataset, 202, &mut rng).unwrap();
    assert_eq!(r.severity, Severity::SignificantSpike);
    assert_eq!(r.rounded_percentage(), "56");

    // the 210 -> 150 drop outweighs the 200 -> 230 rise
    let r = node_report(&dataset, 303, &mut rng).unwrap();
    assert_eq!(r.actual, 150);
    assert_eq!(r.severity, Severity::Anomaly);
    assert!(r.explanation.contains("-29%"));
}

#[test]
fn test_seeded_reports_are_reproducible() {
    let dataset = load_observations(Path::new(FIXTURE)).unwrap();

    let a = node_report(&dataset, 101, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    let b = node_report(&dataset, 101, &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_missing_data_file() {
    let err = load_observations(Path::new("tests/fixtures/does_not_exist.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}

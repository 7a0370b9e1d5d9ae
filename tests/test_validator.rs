//! Integration tests for the series validator.

use dotflow::dot_core::{DotError, DotVersion, Validator};
use dotflow::store::{DotStore, SqliteDotStore};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> SqliteDotStore {
    SqliteDotStore::open(dir.path().join("dotflow.db")).unwrap()
}

#[test]
fn test_contiguous_series_passes() {
    let dir = TempDir::new().unwrap();
    let dots = open_store(&dir);

    for timestamp in [0, 60, 120, 180] {
        dots.insert_if_absent(DotVersion::V1, timestamp, r#"{"d":0.0}"#)
            .unwrap();
    }

    let report = Validator::new(&dots, DotVersion::V1).validate().unwrap();
    assert_eq!(report.records, 4);
}

#[test]
fn test_gap_is_reported_with_offending_timestamp_and_delta() {
    let dir = TempDir::new().unwrap();
    let dots = open_store(&dir);

    for timestamp in [0, 60, 180] {
        dots.insert_if_absent(DotVersion::V1, timestamp, r#"{"d":0.0}"#)
            .unwrap();
    }

    match Validator::new(&dots, DotVersion::V1).validate() {
        Err(DotError::Continuity { prev, next, delta }) => {
            assert_eq!(prev, 60);
            assert_eq!(next, 180);
            assert_eq!(delta, 120);
        }
        other => panic!("expected continuity error, got {:?}", other),
    }
}

#[test]
fn test_misaligned_record_is_reported() {
    let dir = TempDir::new().unwrap();
    let dots = open_store(&dir);

    dots.insert_if_absent(DotVersion::V1, 60, r#"{"d":0.0}"#)
        .unwrap();
    dots.insert_if_absent(DotVersion::V1, 90, r#"{"d":0.0}"#)
        .unwrap();

    match Validator::new(&dots, DotVersion::V1).validate() {
        Err(DotError::Alignment { timestamp }) => assert_eq!(timestamp, 90),
        other => panic!("expected alignment error, got {:?}", other),
    }
}

#[test]
fn test_empty_series_validates() {
    let dir = TempDir::new().unwrap();
    let dots = open_store(&dir);

    let report = Validator::new(&dots, DotVersion::V1).validate().unwrap();
    assert_eq!(report.records, 0);
}

#[test]
fn test_versions_are_validated_independently() {
    let dir = TempDir::new().unwrap();
    let dots = open_store(&dir);

    // v1 has a gap, v2 is clean
    for timestamp in [0, 120] {
        dots.insert_if_absent(DotVersion::V1, timestamp, r#"{"d":0.0}"#)
            .unwrap();
    }
    for timestamp in [0, 60] {
        dots.insert_if_absent(DotVersion::V2, timestamp, r#"{"d":0.0,"s":[]}"#)
            .unwrap();
    }

    assert!(Validator::new(&dots, DotVersion::V1).validate().is_err());
    assert!(Validator::new(&dots, DotVersion::V2).validate().is_ok());
}

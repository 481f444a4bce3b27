//! Tests for store module

use stagemap::normalize::format_date;
use stagemap::{EventRecord, ReconciliationStore};
use std::path::PathBuf;

fn record(date: &str, title: &str) -> EventRecord {
    EventRecord {
        date: date.to_string(),
        date_display: format_date(date).unwrap(),
        title: title.to_string(),
        category: "Frances".to_string(),
        start_label: "Sarria".to_string(),
        start_lat: 42.7797,
        start_lon: -7.4143,
        end_label: "Portomarin".to_string(),
        end_lat: Some(42.8073),
        end_lon: Some(-7.6158),
        distance_km: 22.2,
        elevation_gain_m: Some(420.0),
        duration: "5h 45min 00sec".to_string(),
        notes: String::new(),
        color: "red".to_string(),
        narrative_link: String::new(),
        photo_ref: "sarria.jpg".to_string(),
        track_ref: Some(PathBuf::from("gpx/sarria.gpx")),
    }
}

#[test]
fn test_sync_inserts_all_records() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    let records = vec![
        record("1.1.2022", "Day 1"),
        record("2.1.2022", "Day 2"),
        record("3.1.2022", "Day 3"),
    ];

    let report = store.sync(&records).unwrap();
    assert_eq!(report.inserted, 3);
    assert_eq!(report.updated, 0);
    assert_eq!(report.deleted, 0);
    assert_eq!(store.count().unwrap(), 3);
}

#[test]
fn test_sync_same_snapshot_is_noop() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    let records = vec![record("1.1.2022", "Day 1"), record("2.1.2022", "Day 2")];

    store.sync(&records).unwrap();
    let second = store.sync(&records).unwrap();
    assert!(second.is_noop());
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_sync_updates_changed_record() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    let mut records = vec![record("1.1.2022", "Day 1")];
    store.sync(&records).unwrap();

    records[0].notes = "Knee started hurting".to_string();
    records[0].distance_km = 24.0;
    let report = store.sync(&records).unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 1);
    assert_eq!(report.deleted, 0);

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded[0].notes, "Knee started hurting");
    assert_eq!(loaded[0].distance_km, 24.0);
}

#[test]
fn test_sync_deletes_absent_dates() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    store
        .sync(&[record("1.1.2022", "Day 1"), record("2.1.2022", "Day 2")])
        .unwrap();

    let report = store.sync(&[record("2.1.2022", "Day 2")]).unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 0);

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].date, "2.1.2022");
}

#[test]
fn test_sync_empty_snapshot_clears_store() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    store
        .sync(&[record("1.1.2022", "Day 1"), record("2.1.2022", "Day 2")])
        .unwrap();

    let report = store.sync(&[]).unwrap();
    assert_eq!(report.deleted, 2);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_sync_mixed_update_and_insert() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    store.sync(&[record("1.1.2022", "Day 1")]).unwrap();

    let mut changed = record("1.1.2022", "Day 1");
    changed.color = "green".to_string();
    let report = store
        .sync(&[changed, record("2.1.2022", "Day 2")])
        .unwrap();
    assert_eq!(report.inserted, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.deleted, 0);
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn test_load_all_keeps_insertion_order() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    let records = vec![
        record("3.1.2022", "Day 3"),
        record("1.1.2022", "Day 1"),
        record("2.1.2022", "Day 2"),
    ];
    store.sync(&records).unwrap();

    let loaded = store.load_all().unwrap();
    let titles: Vec<&str> = loaded.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Day 3", "Day 1", "Day 2"]);
}

#[test]
fn test_roundtrip_preserves_record() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    let full = record("1.1.2022", "Day 1");

    let mut sparse = record("2.1.2022", "Rest day");
    sparse.end_lat = None;
    sparse.end_lon = None;
    sparse.elevation_gain_m = None;
    sparse.track_ref = None;
    sparse.distance_km = 0.0;

    store.sync(&[full.clone(), sparse.clone()]).unwrap();
    let loaded = store.load_all().unwrap();
    assert_eq!(loaded, vec![full, sparse]);
}

#[test]
fn test_rebuild_discards_everything() {
    let mut store = ReconciliationStore::open_in_memory().unwrap();
    store.sync(&[record("1.1.2022", "Day 1")]).unwrap();
    assert_eq!(store.count().unwrap(), 1);

    store.rebuild().unwrap();
    assert_eq!(store.count().unwrap(), 0);

    // The table is usable again after the rebuild
    let report = store.sync(&[record("1.1.2022", "Day 1")]).unwrap();
    assert_eq!(report.inserted, 1);
}

#[test]
fn test_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stages.db");

    {
        let mut store = ReconciliationStore::open(&path).unwrap();
        store
            .sync(&[record("1.1.2022", "Day 1"), record("2.1.2022", "Day 2")])
            .unwrap();
    }

    let store = ReconciliationStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 2);

    let stats = store.stats().unwrap();
    assert_eq!(stats.rows, 2);
    // Surrogate id plus the seventeen record columns
    assert_eq!(stats.columns, 18);
}

//! Checkpoint seeding behavior across the three resources.

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use aegis_cli::checkpoint::{CheckpointValue, CursorStore, ResourceKind};
use aegis_cli::query::{AlertQuery, AuditLogQuery, FileEventQuery};

fn stored_ts() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[test]
fn test_alert_seed_overrides_user_start_time() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
    store
        .replace("daily", &CheckpointValue::format_timestamp(stored_ts()))
        .unwrap();

    let mut query = AlertQuery::new();
    query.on_or_after = Some(stored_ts() - Duration::days(90));
    let seeded = query
        .seed_from_checkpoint(&store, "daily", Duration::zero())
        .unwrap();

    assert!(seeded);
    assert_eq!(query.on_or_after, Some(stored_ts()));
}

#[test]
fn test_audit_seed_preserves_other_filters() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::AuditLog);
    store
        .replace("daily", &CheckpointValue::format_timestamp(stored_ts()))
        .unwrap();

    let mut query = AuditLogQuery::new();
    query.event_types = vec!["audit_log::logged_in".to_string()];
    query
        .seed_from_checkpoint(&store, "daily", Duration::zero())
        .unwrap();

    assert_eq!(query.start_time, Some(stored_ts()));
    assert_eq!(query.event_types, vec!["audit_log::logged_in"]);
}

/// Sub-second precision survives the float round trip through the store.
#[test]
fn test_seed_round_trips_microsecond_timestamps() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
    let ts = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.123456Z")
        .unwrap()
        .with_timezone(&Utc);
    store
        .replace("precise", &CheckpointValue::format_timestamp(ts))
        .unwrap();

    let mut query = AlertQuery::new();
    query
        .seed_from_checkpoint(&store, "precise", Duration::zero())
        .unwrap();
    assert_eq!(query.on_or_after, Some(ts));
}

#[test]
fn test_file_event_fresh_query_used_when_no_checkpoint() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::FileEvent);

    let mut fresh = FileEventQuery::new();
    fresh.event_action = Some("file-downloaded".to_string());
    let (query, was_stored) =
        FileEventQuery::resume_or_new(&store, "export", fresh.clone()).unwrap();

    assert!(!was_stored);
    assert_eq!(query, fresh);
}

#[test]
fn test_corrupt_stored_file_event_query_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::FileEvent);
    store.replace("export", "{not json").unwrap();

    let result = FileEventQuery::resume_or_new(&store, "export", FileEventQuery::new());
    assert!(result.is_err());
}

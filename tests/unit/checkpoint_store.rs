//! Cursor store behavior through the public API.

use tempfile::TempDir;

use aegis_cli::checkpoint::{CheckpointError, CheckpointValue, CursorStore, ResourceKind};

#[test]
fn test_first_run_has_no_state() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::AuditLog);
    assert_eq!(store.get("daily").unwrap(), None);
    assert!(store.get_items("daily").unwrap().is_empty());
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn test_replace_survives_reopening_the_store() {
    let dir = TempDir::new().unwrap();
    {
        let store = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
        store.replace("daily", "1714564800.000000").unwrap();
        store
            .replace_items("daily", &["a-1".to_string(), "a-2".to_string()])
            .unwrap();
    }

    // A fresh store over the same directory sees the persisted state.
    let reopened = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
    assert_eq!(
        reopened.get("daily").unwrap().as_deref(),
        Some("1714564800.000000")
    );
    assert_eq!(reopened.get_items("daily").unwrap(), vec!["a-1", "a-2"]);
}

#[test]
fn test_list_all_parses_both_value_kinds() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::FileEvent);
    store.replace("ts", "1714564800.500000").unwrap();
    store.replace("qs", "{\"pageSize\":500}").unwrap();

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 2);
    assert!(matches!(all[0].value, CheckpointValue::QueryState(_)));
    assert!(matches!(all[1].value, CheckpointValue::Timestamp(_)));
}

#[test]
fn test_double_delete_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
    store.replace("once", "1.0").unwrap();

    store.delete("once").unwrap();
    assert!(matches!(
        store.delete("once"),
        Err(CheckpointError::NotFound { .. })
    ));
}

#[test]
fn test_garbage_value_file_fails_strict_parse() {
    let dir = TempDir::new().unwrap();
    let store = CursorStore::new(dir.path(), "client-1", ResourceKind::Alert);
    store.replace("bad", "not-a-timestamp").unwrap();

    let raw = store.get("bad").unwrap().unwrap();
    assert!(matches!(
        CheckpointValue::parse_timestamp(&raw),
        Err(CheckpointError::InvalidValue(_))
    ));
}

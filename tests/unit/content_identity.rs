//! Content-hash identity for audit events.

use chrono::DateTime;

use aegis_cli::checkpoint::identity::content_hash;
use aegis_cli::AuditEvent;

fn event(event_type: &str, detail: serde_json::Value) -> AuditEvent {
    let mut map = serde_json::Map::new();
    if let serde_json::Value::Object(fields) = detail {
        map = fields;
    }
    AuditEvent {
        timestamp: DateTime::from_timestamp(1_714_564_800, 0).unwrap(),
        event_type: event_type.to_string(),
        actor_id: Some("u-1".to_string()),
        actor_name: Some("jo".to_string()),
        detail: map,
    }
}

#[test]
fn test_identical_events_hash_identically() {
    let a = event("audit_log::logged_in", serde_json::json!({"sourceIp": "10.0.0.1"}));
    let b = event("audit_log::logged_in", serde_json::json!({"sourceIp": "10.0.0.1"}));
    assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
}

#[test]
fn test_any_field_change_changes_the_hash() {
    let base = event("audit_log::logged_in", serde_json::json!({"sourceIp": "10.0.0.1"}));

    let other_type = event("audit_log::logged_out", serde_json::json!({"sourceIp": "10.0.0.1"}));
    assert_ne!(
        content_hash(&base).unwrap(),
        content_hash(&other_type).unwrap()
    );

    let other_detail = event("audit_log::logged_in", serde_json::json!({"sourceIp": "10.0.0.2"}));
    assert_ne!(
        content_hash(&base).unwrap(),
        content_hash(&other_detail).unwrap()
    );
}

#[test]
fn test_hash_is_hex_sha256() {
    let hash = content_hash(&event("t", serde_json::json!({}))).unwrap();
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

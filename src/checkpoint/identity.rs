//! Event identity for deduplication.
//!
//! Alerts and file events use the provider-assigned event ID. Audit log
//! events have no stable ID in the payload, so their identity is a
//! SHA-256 digest over a canonical serialization with recursively sorted
//! object keys: two payloads with the same field values hash identically
//! regardless of key order on the wire.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Compute the content-hash identity of an event.
pub fn content_hash<E: Serialize>(event: &E) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(event)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Serialize a JSON value with object keys in sorted order.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // String keys always serialize cleanly
                let _ = write!(out, "{}:", Value::String((*key).clone()));
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

//! Audit log search query.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::checkpoint::{CheckpointError, CheckpointValue, CursorStore};
use crate::query::SORT_ASCENDING;

/// Wire-format query for the audit log search endpoint.
///
/// Page-number paginated; always sorted ascending by event timestamp.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    /// Lower bound (inclusive) on event time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Upper bound (inclusive) on event time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Restrict to these event types; empty means all
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_types: Vec<String>,
    /// Restrict to these acting users; empty means all
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actor_ids: Vec<String>,
    /// Sort direction; fixed ascending
    pub sort_direction: &'static str,
    /// Zero-based page number
    pub page: u32,
    /// Events per page
    pub page_size: u32,
}

impl AuditLogQuery {
    /// Create an unconstrained query with the fixed ascending sort.
    pub fn new() -> Self {
        Self {
            start_time: None,
            end_time: None,
            event_types: Vec::new(),
            actor_ids: Vec::new(),
            sort_direction: SORT_ASCENDING,
            page: 0,
            page_size: crate::client::PAGE_SIZE,
        }
    }

    /// Seed the lower time bound from a stored checkpoint.
    ///
    /// Same contract as [`crate::query::AlertQuery::seed_from_checkpoint`]:
    /// the stored high-water mark overrides a user-supplied start time,
    /// other filters are untouched, and `overlap` widens the window
    /// backwards for out-of-order upstream mitigation.
    pub fn seed_from_checkpoint(
        &mut self,
        store: &CursorStore,
        name: &str,
        overlap: Duration,
    ) -> Result<bool, CheckpointError> {
        match store.get(name)? {
            Some(raw) => {
                let ts = CheckpointValue::parse_timestamp(&raw)?;
                self.start_time = Some(ts - overlap);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::ResourceKind;
    use tempfile::TempDir;

    #[test]
    fn test_empty_filter_vecs_are_omitted() {
        let query = AuditLogQuery::new();
        let json = serde_json::to_value(&query).unwrap();
        assert!(json.get("eventTypes").is_none());
        assert!(json.get("actorIds").is_none());
        assert_eq!(json["sortDirection"], "asc");
    }

    #[test]
    fn test_seeding_preserves_event_type_filter() {
        let dir = TempDir::new().unwrap();
        let store = CursorStore::new(dir.path(), "client-1", ResourceKind::AuditLog);
        let ts = DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store
            .replace("nightly", &CheckpointValue::format_timestamp(ts))
            .unwrap();

        let mut query = AuditLogQuery::new();
        query.event_types = vec!["audit_log::logged_in".to_string()];
        let seeded = query
            .seed_from_checkpoint(&store, "nightly", Duration::zero())
            .unwrap();

        assert!(seeded);
        assert_eq!(query.start_time, Some(ts));
        assert_eq!(query.event_types.len(), 1);
    }
}

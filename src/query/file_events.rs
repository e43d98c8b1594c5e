//! File event search query.
//!
//! File event search is token-paginated, so its checkpoint persists the
//! whole serialized query (token included) rather than a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkpoint::{CheckpointError, CursorStore};
use crate::query::SORT_ASCENDING;

/// Wire-format query for the file event search endpoint.
///
/// Token-paginated; always sorted ascending by event timestamp. The full
/// query round-trips through the checkpoint store, so every field is
/// serializable in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEventQuery {
    /// Lower bound (inclusive) on event time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Upper bound (inclusive) on event time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Filter to one observed action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_action: Option<String>,
    /// Filter to events touching one file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Filter to one user's activity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Opaque continuation token; absent on the first page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
    /// Events per page
    pub page_size: u32,
    /// Sort field; fixed to the filtering timestamp
    pub sort_key: String,
    /// Sort direction; fixed ascending
    pub sort_direction: String,
}

impl FileEventQuery {
    /// Create an unconstrained query with the fixed ascending sort.
    pub fn new() -> Self {
        Self {
            start_time: None,
            end_time: None,
            event_action: None,
            file_name: None,
            user: None,
            page_token: None,
            page_size: crate::client::PAGE_SIZE,
            sort_key: "eventTimestamp".to_string(),
            sort_direction: SORT_ASCENDING.to_string(),
        }
    }

    /// Resume the stored query for `name`, or start from `fresh`.
    ///
    /// A stored query-state checkpoint supersedes the freshly built query
    /// wholesale, page token and filters alike: a checkpointed
    /// token-paginated search locks in its original query. Returns the
    /// query to run and whether it came from the store.
    pub fn resume_or_new(
        store: &CursorStore,
        name: &str,
        fresh: FileEventQuery,
    ) -> Result<(Self, bool), CheckpointError> {
        match store.get(name)? {
            Some(raw) => {
                let stored: FileEventQuery = serde_json::from_str(&raw).map_err(|e| {
                    CheckpointError::InvalidValue(format!(
                        "stored file-event query is not parseable: {e}"
                    ))
                })?;
                Ok((stored, true))
            }
            None => Ok((fresh, false)),
        }
    }
}

impl Default for FileEventQuery {
    fn default() -> Self {
        Self::new()
    }
}

//! Alert search query.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::checkpoint::{CheckpointError, CheckpointValue, CursorStore};
use crate::query::SORT_ASCENDING;
use crate::{AlertState, Severity};

/// Wire-format query for the alert search endpoint.
///
/// Page-number paginated; always sorted ascending by `createdAt`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    /// Lower bound (inclusive) on alert creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_or_after: Option<DateTime<Utc>>,
    /// Upper bound (inclusive) on alert creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_or_before: Option<DateTime<Utc>>,
    /// Filter to a single workflow state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<AlertState>,
    /// Filter to a single severity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Filter to alerts produced by one rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Sort field; fixed to the filtering timestamp
    pub sort_key: &'static str,
    /// Sort direction; fixed ascending
    pub sort_direction: &'static str,
    /// Zero-based page number
    pub page_num: u32,
    /// Events per page
    pub page_size: u32,
}

impl AlertQuery {
    /// Create an unconstrained query with the fixed ascending sort.
    pub fn new() -> Self {
        Self {
            on_or_after: None,
            on_or_before: None,
            state: None,
            severity: None,
            rule_id: None,
            sort_key: "CreatedAt",
            sort_direction: SORT_ASCENDING,
            page_num: 0,
            page_size: crate::client::PAGE_SIZE,
        }
    }

    /// Seed the lower time bound from a stored checkpoint.
    ///
    /// When a value exists it overrides any user-supplied start time;
    /// other filters on the query are left untouched. `overlap` moves
    /// the seeded bound backwards to absorb slightly out-of-order
    /// upstream events, relying on the seen-set to filter re-deliveries.
    ///
    /// Returns `true` if a checkpoint value was found and applied.
    pub fn seed_from_checkpoint(
        &mut self,
        store: &CursorStore,
        name: &str,
        overlap: Duration,
    ) -> Result<bool, CheckpointError> {
        match store.get(name)? {
            Some(raw) => {
                let ts = CheckpointValue::parse_timestamp(&raw)?;
                self.on_or_after = Some(ts - overlap);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self::new()
    }
}

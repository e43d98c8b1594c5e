//! Per-resource query builders.
//!
//! Every query hardcodes an ascending sort on its filtering timestamp;
//! the checkpoint update algorithm is only correct over a non-decreasing
//! timestamp stream, so ordering is never left to the caller.
//!
//! Checkpoint seeding follows two distinct resume contracts:
//!
//! - **Timestamp checkpoints** (alerts, audit log): the stored high-water
//!   mark replaces the query's lower time bound; all other user-supplied
//!   filters still apply to the run.
//! - **Query-state checkpoints** (file events): the stored serialized
//!   query, including its page token, supersedes a freshly built query
//!   wholesale. Checkpointed token-paginated searches lock in their
//!   original filters; this is a documented limitation.

pub mod alerts;
pub mod audit_log;
pub mod file_events;

pub use alerts::AlertQuery;
pub use audit_log::AuditLogQuery;
pub use file_events::FileEventQuery;

/// Sort direction sent for every search.
pub(crate) const SORT_ASCENDING: &str = "asc";

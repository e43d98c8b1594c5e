//! Checkpointed incremental search support.
//!
//! A checkpoint is a named, profile-scoped resume point for an
//! incremental search: a high-water-mark timestamp (or, for
//! token-paginated searches, a serialized query) plus the bounded set of
//! event identifiers sharing that exact timestamp. [`store`] persists
//! them, [`update`] applies them to a live event stream, and
//! [`identity`] derives identifiers for events that have none.

pub mod identity;
pub mod store;
pub mod update;

pub use store::{Checkpoint, CheckpointValue, CursorStore, ResourceKind};
pub use update::{CheckpointedStream, PersistMode, SearchError};

/// Errors from the checkpoint subsystem.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// A named checkpoint does not exist; surfaced as a usage error
    #[error("checkpoint '{name}' does not exist")]
    NotFound {
        /// The checkpoint name the user supplied
        name: String,
    },

    /// A stored checkpoint value could not be interpreted
    #[error("invalid checkpoint value: {0}")]
    InvalidValue(String),

    /// Filesystem failure other than "not found"; propagates to the
    /// top-level handler rather than being swallowed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization of checkpoint state failed
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

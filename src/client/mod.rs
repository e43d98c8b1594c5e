//! API transport and per-resource search clients.
//!
//! The per-resource clients produce *lazy* event streams: each page is
//! fetched from the API only when the consumer pulls past the previous
//! page's last event. Every stream is sorted ascending by the resource's
//! filtering timestamp, which downstream checkpoint deduplication relies
//! on as a hard precondition.

use futures_util::Stream;
use std::pin::Pin;
use std::time::Duration;

pub mod alerts;
pub mod audit_log;
pub mod file_events;
pub mod http;

pub use alerts::AlertsClient;
pub use audit_log::AuditLogClient;
pub use file_events::FileEventsClient;

/// Transport and API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network-level failure (timeout, connection refused)
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status from the API
    #[error("API error {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Rate limit exhausted after all retries
    #[error("rate limit exceeded")]
    RateLimited,

    /// Response body could not be deserialized
    #[error("parse error: {0}")]
    Parse(String),

    /// Authentication against the token endpoint failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Pagination ran away past the safety cap
    #[error("page limit ({0}) exceeded - possible pagination loop")]
    PageLimitExceeded(usize),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// A lazy, pull-based stream of events from a paginated search.
pub type EventStream<E> = Pin<Box<dyn Stream<Item = ApiResult<E>> + Send>>;

/// Maximum number of pages fetched per search to prevent infinite loops.
pub(crate) const MAX_PAGES: usize = 10_000;

/// Events requested per page.
pub(crate) const PAGE_SIZE: u32 = 500;

/// Maximum number of retries for failed requests.
/// 5 retries with exponential backoff recovers from transient failures
/// and rate limit windows without stalling indefinitely.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Calculate exponential backoff delay for a retry attempt.
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS * 2u64.pow(retry_count);
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

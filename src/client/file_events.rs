//! File event search client.
//!
//! Unlike the page-number searches, file event pagination is driven by
//! an opaque continuation token returned with each page. The query is
//! shared behind a mutex so the checkpoint layer can snapshot it (token
//! included) at any point during consumption.

use std::sync::{Arc, Mutex};

use futures_util::{stream, TryStreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::client::http::ApiHttpClient;
use crate::client::{ApiError, EventStream, MAX_PAGES};
use crate::query::FileEventQuery;
use crate::FileEvent;

const SEARCH_ENDPOINT: &str = "/v1/file-events/search";

/// A file event query shared between the paginating stream, which
/// advances its token, and the checkpoint layer, which serializes it.
pub type SharedFileEventQuery = Arc<Mutex<FileEventQuery>>;

/// One page of the file event search response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEventPage {
    file_events: Vec<FileEvent>,
    #[serde(default)]
    next_pg_token: Option<String>,
}

/// Lock helper; a poisoned lock just means another holder panicked
/// mid-read, and the query itself is still valid.
pub fn lock_query(query: &SharedFileEventQuery) -> std::sync::MutexGuard<'_, FileEventQuery> {
    query.lock().unwrap_or_else(|e| e.into_inner())
}

/// Client for the token-paginated file event search.
pub struct FileEventsClient {
    http: ApiHttpClient,
}

impl FileEventsClient {
    /// Wrap an authenticated HTTP client.
    pub fn new(http: ApiHttpClient) -> Self {
        Self { http }
    }

    /// Stream all file events matching the shared query, ascending by
    /// event timestamp.
    ///
    /// After each fetched page the shared query's `page_token` is set to
    /// the server's continuation token, so a snapshot taken between any
    /// two events resumes from the in-flight page. Terminates after the
    /// page with no continuation token, or errors at the `MAX_PAGES` cap.
    pub fn search(&self, query: SharedFileEventQuery) -> EventStream<FileEvent> {
        let pages = stream::try_unfold(
            (self.http.clone(), query, 0usize, false),
            |(http, query, fetched, done)| async move {
                if done {
                    return Ok(None);
                }
                if fetched >= MAX_PAGES {
                    return Err(ApiError::PageLimitExceeded(MAX_PAGES));
                }

                let body = lock_query(&query).clone();
                let page: FileEventPage = http.post(SEARCH_ENDPOINT, &body).await?;
                debug!(
                    events = page.file_events.len(),
                    has_next = page.next_pg_token.is_some(),
                    "Fetched file event page"
                );

                let (events, last_page) = record_page(&query, page);
                Ok(Some((events, (http, query, fetched + 1, last_page))))
            },
        );

        Box::pin(
            pages
                .map_ok(|events| stream::iter(events.into_iter().map(Ok)))
                .try_flatten(),
        )
    }
}

/// Record a fetched page on the shared query and decide whether it was
/// the final one. Termination follows the continuation token alone: an
/// empty page with a token is an intermediate page and the stream keeps
/// going (bounded by `MAX_PAGES`); only an absent or empty token ends it.
fn record_page(
    query: &SharedFileEventQuery,
    page: FileEventPage,
) -> (Vec<FileEvent>, bool) {
    let last_page = match &page.next_pg_token {
        Some(token) if !token.is_empty() => false,
        _ => true,
    };
    lock_query(query).page_token = page.next_pg_token;
    (page.file_events, last_page)
}

//! Audit log search client.
//!
//! Audit events carry no server-assigned identifier, so downstream
//! deduplication hashes the event content instead (see
//! `checkpoint::identity`). This module only fetches.

use futures_util::{stream, TryStreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::client::http::ApiHttpClient;
use crate::client::{ApiError, EventStream, MAX_PAGES};
use crate::query::AuditLogQuery;
use crate::AuditEvent;

const SEARCH_ENDPOINT: &str = "/v1/audit/search";

/// One page of the audit log search response.
#[derive(Debug, Deserialize)]
struct AuditPage {
    events: Vec<AuditEvent>,
}

/// Client for the page-number paginated audit log search.
pub struct AuditLogClient {
    http: ApiHttpClient,
}

impl AuditLogClient {
    /// Wrap an authenticated HTTP client.
    pub fn new(http: ApiHttpClient) -> Self {
        Self { http }
    }

    /// Stream all audit events matching `query`, ascending by timestamp.
    ///
    /// Same lazy pagination contract as the alert search: fetch on pull,
    /// stop on the first empty page, error at the `MAX_PAGES` cap.
    pub fn search(&self, query: AuditLogQuery) -> EventStream<AuditEvent> {
        let pages = stream::try_unfold(
            (self.http.clone(), query, 0usize),
            |(http, mut query, fetched)| async move {
                if fetched >= MAX_PAGES {
                    return Err(ApiError::PageLimitExceeded(MAX_PAGES));
                }

                let page: AuditPage = http.post(SEARCH_ENDPOINT, &query).await?;
                debug!(
                    page = query.page,
                    events = page.events.len(),
                    "Fetched audit log page"
                );

                if page.events.is_empty() {
                    return Ok(None);
                }

                query.page += 1;
                Ok(Some((page.events, (http, query, fetched + 1))))
            },
        );

        Box::pin(
            pages
                .map_ok(|events| stream::iter(events.into_iter().map(Ok)))
                .try_flatten(),
        )
    }
}

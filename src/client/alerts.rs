//! Alert search client.

use futures_util::{stream, TryStreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::client::http::ApiHttpClient;
use crate::client::{ApiError, EventStream, MAX_PAGES};
use crate::query::AlertQuery;
use crate::AlertEvent;

const SEARCH_ENDPOINT: &str = "/v1/alerts/query";

/// One page of the alert search response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertPage {
    alerts: Vec<AlertEvent>,
    #[serde(default)]
    total_count: u64,
}

/// Client for the page-number paginated alert search.
pub struct AlertsClient {
    http: ApiHttpClient,
}

impl AlertsClient {
    /// Wrap an authenticated HTTP client.
    pub fn new(http: ApiHttpClient) -> Self {
        Self { http }
    }

    /// Stream all alerts matching `query`, ascending by creation time.
    ///
    /// Pages are fetched lazily as the stream is pulled; abandoning the
    /// stream fetches nothing further. Terminates on the first empty
    /// page, or errors once `MAX_PAGES` pages have been fetched.
    pub fn search(&self, query: AlertQuery) -> EventStream<AlertEvent> {
        let pages = stream::try_unfold(
            (self.http.clone(), query, 0usize),
            |(http, mut query, fetched)| async move {
                if fetched >= MAX_PAGES {
                    return Err(ApiError::PageLimitExceeded(MAX_PAGES));
                }

                let page: AlertPage = http.post(SEARCH_ENDPOINT, &query).await?;
                debug!(
                    page = query.page_num,
                    events = page.alerts.len(),
                    total = page.total_count,
                    "Fetched alert page"
                );

                if page.alerts.is_empty() {
                    return Ok(None);
                }

                query.page_num += 1;
                Ok(Some((page.alerts, (http, query, fetched + 1))))
            },
        );

        Box::pin(
            pages
                .map_ok(|events| stream::iter(events.into_iter().map(Ok)))
                .try_flatten(),
        )
    }
}

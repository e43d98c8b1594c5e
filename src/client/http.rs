//! HTTP client for the Aegis API.
//!
//! Wraps `reqwest` with bearer-token auth and retry logic:
//! - retries network errors, 429 and 5xx with exponential backoff
//! - never retries other 4xx responses
//!
//! Retries are invisible to callers; a returned page is always a
//! successfully fetched page.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{calculate_backoff, ApiError, ApiResult, MAX_RETRIES};
use crate::config::Profile;

/// Token endpoint path.
const OAUTH_ENDPOINT: &str = "/v1/oauth";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticated HTTP client for the Aegis API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiHttpClient {
    /// Authenticate with client credentials and return a ready client.
    pub async fn connect(profile: &Profile) -> ApiResult<Self> {
        let client = Client::new();
        let url = format!("{}{}", profile.base_url, OAUTH_ENDPOINT);

        debug!(url = %url, client_id = %profile.api_client_id, "Requesting access token");

        let response = client
            .post(&url)
            .basic_auth(&profile.api_client_id, Some(&profile.api_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("token response: {e}")))?;

        Ok(Self {
            client,
            base_url: profile.base_url.clone(),
            token: token.access_token,
        })
    }

    /// Build a client around an already-issued token, for callers that
    /// manage token acquisition themselves.
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Execute a GET request with query parameters.
    pub async fn get<T>(&self, endpoint: &str, params: &[(&str, String)]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, params = params.len(), "GET");
        self.send_with_retry(|| {
            self.client
                .get(&url)
                .bearer_auth(&self.token)
                .query(params)
        })
        .await
    }

    /// Execute a POST request with a JSON body.
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "POST");
        self.send_with_retry(|| {
            self.client
                .post(&url)
                .bearer_auth(&self.token)
                .json(body)
        })
        .await
    }

    /// Send a request with retry and exponential backoff.
    ///
    /// Retries on network errors, 429 and 5xx; other client errors are
    /// returned immediately.
    async fn send_with_retry<T>(&self, build: impl Fn() -> RequestBuilder) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            let response = match build().send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(
                        "Network error on attempt {}/{}: {}",
                        attempt + 1,
                        MAX_RETRIES + 1,
                        e
                    );
                    last_error = Some(ApiError::Network(e.to_string()));
                    if attempt < MAX_RETRIES {
                        let backoff = calculate_backoff(attempt);
                        debug!("Retrying after {:?}", backoff);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                warn!(
                    "Rate limited (429) on attempt {}/{}",
                    attempt + 1,
                    MAX_RETRIES + 1
                );
                last_error = Some(ApiError::RateLimited);
                if attempt < MAX_RETRIES {
                    let backoff = calculate_backoff(attempt);
                    debug!("Retrying after {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                break;
            }

            if status.is_server_error() {
                warn!(
                    "Server error {} on attempt {}/{}",
                    status,
                    attempt + 1,
                    MAX_RETRIES + 1
                );
                last_error = Some(ApiError::Status {
                    status: status.as_u16(),
                    message: status.to_string(),
                });
                if attempt < MAX_RETRIES {
                    let backoff = calculate_backoff(attempt);
                    debug!("Retrying after {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                break;
            }

            if status.is_client_error() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            return match response.json::<T>().await {
                Ok(data) => {
                    debug!("Request succeeded on attempt {}", attempt + 1);
                    Ok(data)
                }
                Err(e) => Err(ApiError::Parse(format!(
                    "failed to deserialize response: {e}"
                ))),
            };
        }

        Err(last_error.unwrap_or_else(|| ApiError::Network("all retries exhausted".to_string())))
    }
}

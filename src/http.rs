//! Authenticated HTTP transport with retry and backoff
//!
//! Provides the single JSON GET primitive every other module goes through:
//! - Token authentication on every request
//! - Exponential backoff on transient failures (network errors plus the
//!   configured status forcelist)
//! - Immediate abort on authentication errors, which retrying cannot fix
//! - JSON-only response handling

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{RetryPolicy, Timeouts};

/// Errors surfaced by the transport layer
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The service rejected our credentials. Never retried.
    #[error("authentication rejected (HTTP {status}) for {url}")]
    Auth {
        /// Response status, 401 or 403
        status: u16,
        /// URL of the rejected request
        url: String,
    },

    /// Non-success status that is neither retryable nor an auth failure,
    /// or a retryable status that survived the whole retry budget
    #[error("HTTP {status} for {url}")]
    Status {
        /// Response status code
        status: u16,
        /// URL of the failed request
        url: String,
    },

    /// Response arrived but its body is not usable JSON
    #[error("undecodable response from {url}: {detail}")]
    Decode {
        /// URL of the response
        url: String,
        /// What went wrong while decoding
        detail: String,
    },

    /// Connection-level failure after exhausting the retry budget
    #[error("network error for {url}: {detail}")]
    Network {
        /// URL of the attempted request
        url: String,
        /// Underlying error text
        detail: String,
    },

    /// The underlying HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// HTTP client with token auth, timeouts, and a retry budget.
///
/// All requests are GETs, so every retry is safe to repeat.
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Create a new transport.
    ///
    /// The API key is baked into default headers so call sites never handle
    /// credentials. The read timeout bounds the whole request once connected.
    pub fn new(timeouts: &Timeouts, retry: RetryPolicy, api_key: &str) -> TransportResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Token {api_key}"))
            .map_err(|e| TransportError::Build(format!("invalid API key: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .connect_timeout(timeouts.connect_duration())
            .timeout(timeouts.read_duration())
            .default_headers(headers)
            .user_agent(concat!("mindat-downloader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self { client, retry })
    }

    /// Execute a GET request and decode the JSON body.
    ///
    /// Retries on:
    /// - Network errors (timeout, connection refused, reset)
    /// - Statuses in the configured forcelist (429 and 5xx by default)
    ///
    /// Does not retry on:
    /// - 401/403, which fail immediately as [`TransportError::Auth`]
    /// - Any other non-success status
    /// - Undecodable bodies
    pub async fn get_json(&self, url: &str, params: &[(String, String)]) -> TransportResult<Value> {
        let attempts = self.retry.total.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let response = match self.client.get(url).query(params).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(
                        "Network error on attempt {}/{} for {}: {}",
                        attempt + 1,
                        attempts,
                        url,
                        e
                    );
                    last_error = Some(TransportError::Network {
                        url: url.to_string(),
                        detail: e.to_string(),
                    });

                    if attempt + 1 < attempts {
                        self.wait_before_retry(attempt).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status().as_u16();
            let final_url = response.url().to_string();

            // Bad credentials stay bad no matter how often we ask
            if status == 401 || status == 403 {
                return Err(TransportError::Auth {
                    status,
                    url: final_url,
                });
            }

            if self.retry.is_retryable_status(status) {
                warn!(
                    "HTTP {} on attempt {}/{} for {}",
                    status,
                    attempt + 1,
                    attempts,
                    final_url
                );
                last_error = Some(TransportError::Status {
                    status,
                    url: final_url,
                });

                if attempt + 1 < attempts {
                    self.wait_before_retry(attempt).await;
                    continue;
                }
                break;
            }

            if !(200..300).contains(&status) {
                return Err(TransportError::Status {
                    status,
                    url: final_url,
                });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase();
            if !content_type.contains("json") {
                return Err(TransportError::Decode {
                    url: final_url,
                    detail: format!("expected a JSON body, got content type {content_type:?}"),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TransportError::Network {
                    url: final_url.clone(),
                    detail: e.to_string(),
                })?;

            return match serde_json::from_slice(&bytes) {
                Ok(body) => {
                    debug!("Request succeeded on attempt {}", attempt + 1);
                    Ok(body)
                }
                Err(e) => Err(TransportError::Decode {
                    url: final_url,
                    detail: e.to_string(),
                }),
            };
        }

        // All retries exhausted
        Err(last_error.unwrap_or_else(|| TransportError::Network {
            url: url.to_string(),
            detail: "all retries exhausted".to_string(),
        }))
    }

    async fn wait_before_retry(&self, attempt: u32) {
        let backoff = self.retry.backoff_delay(attempt);
        debug!("Retrying after {:?}", backoff);
        tokio::time::sleep(backoff).await;
    }
}

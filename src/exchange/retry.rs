use crate::error::{SourceError, SourceResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Retry schedule shared by the REST clients
///
/// Waits grow linearly with the attempt number: attempt `n` (0-based)
/// sleeps `(n + 1) * backoff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_backoff_ms: u64,  // after HTTP 429
    pub error_backoff_ms: u64,       // after a transport error
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_backoff_ms: 10_000,
            error_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms.saturating_mul(attempt as u64 + 1))
    }

    pub fn error_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.error_backoff_ms.saturating_mul(attempt as u64 + 1))
    }

    /// Send a request, retrying on 429 and transport errors
    ///
    /// `build` is called once per attempt because a RequestBuilder is
    /// consumed by `send`. Other non-success statuses fail immediately.
    pub async fn send<F>(&self, mut build: F) -> SourceResult<Response>
    where
        F: FnMut() -> RequestBuilder,
    {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let is_last = attempt + 1 == attempts;

            match build().send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    if is_last {
                        break;
                    }
                    let wait = self.rate_limit_delay(attempt);
                    warn!("Rate limited, retrying in {:?} (attempt {}/{})", wait, attempt + 1, attempts);
                    tokio::time::sleep(wait).await;
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    return Err(SourceError::Status { status, body });
                }
                Ok(response) => {
                    debug!("Request succeeded on attempt {}", attempt + 1);
                    return Ok(response);
                }
                Err(err) => {
                    if is_last {
                        return Err(SourceError::Http(err));
                    }
                    let wait = self.error_delay(attempt);
                    warn!("Request failed: {}, retrying in {:?}", err, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }

        Err(SourceError::RateLimited { attempts })
    }
}

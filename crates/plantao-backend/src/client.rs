// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level backend HTTP plumbing: timeout, exponential-backoff retry and a
//! per-endpoint circuit breaker.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, warn};

use plantao_core::breaker::{BreakerConfig, CircuitBreaker, CircuitState};

use crate::error::BackendError;

/// Shared HTTP machinery for every endpoint call.
pub struct BackendHttp {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
    breakers: DashMap<&'static str, Arc<CircuitBreaker>>,
}

impl BackendHttp {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::Transient {
                endpoint: "client",
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            breakers: DashMap::new(),
        })
    }

    fn breaker(&self, endpoint: &'static str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(endpoint)
            .or_insert_with(|| Arc::new(CircuitBreaker::new(BreakerConfig::default())))
            .clone()
    }

    /// True when no endpoint circuit is open.
    pub fn all_circuits_closed(&self) -> bool {
        self.breakers
            .iter()
            .all(|entry| entry.value().state() != CircuitState::Open)
    }

    /// POST a JSON body and parse a JSON response, with retry and breaker.
    pub async fn post_json(
        &self,
        endpoint: &'static str,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let breaker = self.breaker(endpoint);
        if !breaker.can_execute() {
            return Err(BackendError::CircuitOpen { endpoint });
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(200u64 * (1u64 << (attempt - 1)));
                warn!(endpoint, attempt, ?backoff, "retrying backend call");
                tokio::time::sleep(backoff).await;
            }

            let result = self
                .client
                .post(url)
                .timeout(self.timeout)
                .json(body)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    debug!(endpoint, status = %status, attempt, "backend response");
                    if status.is_success() {
                        breaker.record_success();
                        let text = response.text().await.unwrap_or_default();
                        if text.trim().is_empty() {
                            return Ok(serde_json::Value::Null);
                        }
                        return serde_json::from_str(&text).map_err(|e| {
                            BackendError::Permanent5xx {
                                endpoint,
                                status: status.as_u16(),
                                message: format!("unparseable response body: {e}"),
                            }
                        });
                    }

                    let retryable = matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504);
                    let message = response.text().await.unwrap_or_default();
                    if retryable && attempt < self.max_retries {
                        breaker.record_failure();
                        last_error = Some(BackendError::Transient {
                            endpoint,
                            message: format!("{status}: {message}"),
                        });
                        continue;
                    }

                    breaker.record_failure();
                    return Err(if status.is_client_error() {
                        BackendError::Permanent4xx {
                            endpoint,
                            status: status.as_u16(),
                            message,
                        }
                    } else if retryable {
                        BackendError::Transient {
                            endpoint,
                            message: format!("{status}: {message}"),
                        }
                    } else {
                        BackendError::Permanent5xx {
                            endpoint,
                            status: status.as_u16(),
                            message,
                        }
                    });
                }
                Err(err) if err.is_timeout() => {
                    breaker.record_failure();
                    if attempt < self.max_retries {
                        last_error = Some(BackendError::Timeout { endpoint });
                        continue;
                    }
                    return Err(BackendError::Timeout { endpoint });
                }
                Err(err) => {
                    breaker.record_failure();
                    if attempt < self.max_retries {
                        last_error = Some(BackendError::Transient {
                            endpoint,
                            message: err.to_string(),
                        });
                        continue;
                    }
                    return Err(BackendError::Transient {
                        endpoint,
                        message: err.to_string(),
                    });
                }
            }
        }

        Err(last_error.unwrap_or(BackendError::Transient {
            endpoint,
            message: "retries exhausted".into(),
        }))
    }
}

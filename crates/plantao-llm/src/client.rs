// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the chat-completions API.
//!
//! Handles request construction, authentication, per-call timeout and
//! transient error retry. The typed calls live in [`crate::gateway`].

use std::time::Duration;

use plantao_core::PlantaoError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Thin chat-completions client with one transient retry.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    max_transient_retries: u32,
}

impl ChatClient {
    /// Build the client with the bearer key baked into default headers.
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Result<Self, PlantaoError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {api_key}");
        headers.insert(
            "authorization",
            HeaderValue::from_str(&bearer)
                .map_err(|e| PlantaoError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PlantaoError::Llm {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            max_transient_retries: 1,
        })
    }

    /// Send a completion request and return the first choice's content.
    ///
    /// On transient errors (429, 500, 503, 529), retries once after a short delay.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, PlantaoError> {
        let mut last_error = None;

        for attempt in 0..=self.max_transient_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        PlantaoError::LlmUnavailable(format!("request timed out: {e}"))
                    } else {
                        PlantaoError::LlmUnavailable(format!("HTTP request failed: {e}"))
                    }
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model = request.model.as_str(), "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| PlantaoError::Llm {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed: ChatResponse =
                    serde_json::from_str(&body).map_err(|e| PlantaoError::Llm {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .ok_or_else(|| PlantaoError::Llm {
                        message: "API response carried no content".into(),
                        source: None,
                    });
            }

            if is_transient_error(status) && attempt < self.max_transient_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(PlantaoError::LlmUnavailable(format!(
                    "API returned {status}: {body}"
                )));
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "API error ({}): {}",
                    api_err.error.error_type.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                )
            } else {
                format!("API returned {status}: {body}")
            };
            return if is_transient_error(status) {
                Err(PlantaoError::LlmUnavailable(message))
            } else {
                Err(PlantaoError::Llm {
                    message,
                    source: None,
                })
            };
        }

        Err(last_error
            .unwrap_or_else(|| PlantaoError::LlmUnavailable("completion request failed".into())))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, ResponseFormat};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage {
                role: "system".into(),
                content: "classifique".into(),
            }],
            temperature: 0.0,
            max_tokens: 200,
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body(r#"{"intent":"escala","confidence":0.9}"#)),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new("test-key", &server.uri(), 10).unwrap();
        let content = client.complete(&test_request()).await.unwrap();
        assert!(content.contains("escala"));
    }

    #[tokio::test]
    async fn complete_retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"type": "rate_limit_error", "message": "slow down"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
            .mount(&server)
            .await;

        let client = ChatClient::new("test-key", &server.uri(), 10).unwrap();
        let content = client.complete(&test_request()).await.unwrap();
        assert_eq!(content, "ok");
    }

    #[tokio::test]
    async fn complete_fails_permanently_on_400() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"type": "invalid_request_error", "message": "bad model"}
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new("test-key", &server.uri(), 10).unwrap();
        let err = client.complete(&test_request()).await.unwrap_err();
        assert!(matches!(err, PlantaoError::Llm { .. }), "got: {err:?}");
        assert!(err.to_string().contains("invalid_request_error"));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let client = ChatClient::new("test-key", &server.uri(), 10).unwrap();
        let err = client.complete(&test_request()).await.unwrap_err();
        assert!(matches!(err, PlantaoError::LlmUnavailable(_)), "got: {err:?}");
    }
}

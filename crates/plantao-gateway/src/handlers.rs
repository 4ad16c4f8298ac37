// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the ingress API.
//!
//! Handles POST /webhook/ingest, POST /hooks/template-fired, GET /healthz,
//! GET /readyz.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use plantao_core::PlantaoError;
use plantao_engine::{EngineResponse, IngestRequest, TemplateEvent};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response body for GET /healthz.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Response body for GET /readyz.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub persistence: bool,
    pub backend: bool,
}

/// Response body for POST /hooks/template-fired.
#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub message: String,
    pub state_updated: bool,
}

/// POST /webhook/ingest
///
/// Main message ingress. Honors `X-Idempotency-Key` (defaults to the
/// gateway-supplied `message_id`); replayed deliveries return the recorded
/// body verbatim.
pub async fn post_ingest(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(mut request): Json<IngestRequest>,
) -> Response {
    request.idempotency_key = headers
        .get("x-idempotency-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match state.engine.handle_message(request).await {
        Ok(EngineResponse::Fresh {
            status_code,
            response,
        }) => {
            let status =
                StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(response)).into_response()
        }
        Ok(EngineResponse::Replayed { status_code, body }) => {
            let status =
                StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [
                    (header::CONTENT_TYPE, "application/json"),
                    (header::HeaderName::from_static("x-idempotency-replay"), "true"),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => map_error(err),
    }
}

/// POST /hooks/template-fired
///
/// Merges hints from a proactively sent template into the session state.
pub async fn post_template_fired(
    State(state): State<GatewayState>,
    Json(event): Json<TemplateEvent>,
) -> Response {
    let template = event.template.clone();
    match state.engine.handle_template_event(event).await {
        Ok(()) => (
            StatusCode::OK,
            Json(TemplateResponse {
                success: true,
                message: format!("estado atualizado para o template '{template}'"),
                state_updated: true,
            }),
        )
            .into_response(),
        Err(err) => map_error(err),
    }
}

/// GET /healthz — liveness.
pub async fn get_healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /readyz — readiness: persistence round-trip and backend circuits.
pub async fn get_readyz(State(state): State<GatewayState>) -> Response {
    let (persistence, backend) = state.engine.readiness().await;
    let ready = persistence && backend;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            ready,
            checks: ReadinessChecks {
                persistence,
                backend,
            },
        }),
    )
        .into_response()
}

fn map_error(err: PlantaoError) -> Response {
    let status = match &err {
        PlantaoError::InvalidInput(_) | PlantaoError::Config(_) => StatusCode::BAD_REQUEST,
        PlantaoError::LockDenied { .. } => StatusCode::TOO_MANY_REQUESTS,
        PlantaoError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
        PlantaoError::LlmUnavailable(_) | PlantaoError::BackendTransient(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingress HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the webhook gateway.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use plantao_core::PlantaoError;
use plantao_engine::Engine;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: Arc<Engine>,
}

/// Server bind configuration (mirrors `GatewayConfig` from plantao-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the ingress router:
/// - POST /webhook/ingest
/// - POST /hooks/template-fired
/// - GET /healthz
/// - GET /readyz
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/webhook/ingest", post(handlers::post_ingest))
        .route("/hooks/template-fired", post(handlers::post_template_fired))
        .route("/healthz", get(handlers::get_healthz))
        .route("/readyz", get(handlers::get_readyz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process stops.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), PlantaoError> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PlantaoError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("ingress listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| PlantaoError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}

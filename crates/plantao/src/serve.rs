// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency wiring for the `serve` subcommand.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use plantao_backend::HttpShiftBackend;
use plantao_config::PlantaoConfig;
use plantao_core::PlantaoError;
use plantao_engine::Engine;
use plantao_gateway::{start_server, GatewayState, ServerConfig};
use plantao_llm::OpenAiGateway;
use plantao_store::SqliteStore;

fn load() -> Result<PlantaoConfig, PlantaoError> {
    plantao_config::load_config().map_err(|e| PlantaoError::Config(e.to_string()))
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Build the engine from configuration and serve the ingress until shutdown.
pub async fn run() -> Result<(), PlantaoError> {
    let config = load()?;
    init_tracing(&config.agent.log_level);

    let store = Arc::new(SqliteStore::open(&config.storage, &config.engine).await?);
    let llm = Arc::new(OpenAiGateway::new(&config.llm)?);
    let backend = Arc::new(HttpShiftBackend::new(&config.backend, &config.webhook)?);
    let engine = Arc::new(Engine::new(store, llm, backend, config.engine.clone()));

    tracing::info!(
        name = config.agent.name.as_str(),
        database = config.storage.database_path.as_str(),
        "engine assembled"
    );

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    start_server(&server_config, GatewayState { engine }).await
}

/// `plantao config`: validate the layered configuration and print a summary
/// without secrets.
pub fn check_config() -> Result<(), PlantaoError> {
    let config = load()?;
    println!("agent.name           = {}", config.agent.name);
    println!("agent.log_level      = {}", config.agent.log_level);
    println!("gateway              = {}:{}", config.gateway.host, config.gateway.port);
    println!("storage.database     = {}", config.storage.database_path);
    println!(
        "llm.api_key          = {}",
        if config.llm.api_key.is_some() { "set" } else { "MISSING" }
    );
    println!("llm.intent_model     = {}", config.llm.intent_model);
    println!("llm.extractor_model  = {}", config.llm.extractor_model);
    for (name, url) in [
        ("getScheduleStarted", &config.backend.get_schedule_url),
        ("updateWorkScheduleResponse", &config.backend.update_schedule_url),
        ("updateClinicalData", &config.backend.update_clinical_url),
        ("updatereportsummaryad", &config.backend.update_summary_url),
        ("getNoteReport", &config.backend.get_note_report_url),
        ("workflowWebhook", &config.webhook.url),
    ] {
        println!(
            "endpoint.{name:<28} = {}",
            url.as_deref().unwrap_or("MISSING")
        );
    }
    Ok(())
}

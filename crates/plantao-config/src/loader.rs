// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plantao.toml` > `~/.config/plantao/plantao.toml`
//! > `/etc/plantao/plantao.toml` with environment variable overrides via the
//! `PLANTAO_` prefix, plus the well-known operational variables
//! (`OPENAI_API_KEY`, `LAMBDA_*`, `N8N_WEBHOOK_URL`, ...) as fallbacks.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PlantaoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plantao/plantao.toml` (system-wide)
/// 3. `~/.config/plantao/plantao.toml` (user XDG config)
/// 4. `./plantao.toml` (local directory)
/// 5. `PLANTAO_*` environment variables
/// 6. Well-known operational variables (fallback only)
pub fn load_config() -> Result<PlantaoConfig, figment::Error> {
    let mut config: PlantaoConfig = Figment::new()
        .merge(Serialized::defaults(PlantaoConfig::default()))
        .merge(Toml::file("/etc/plantao/plantao.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plantao/plantao.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plantao.toml"))
        .merge(env_provider())
        .extract()?;
    apply_well_known_env(&mut config);
    Ok(config)
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PlantaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlantaoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlantaoConfig, figment::Error> {
    let mut config: PlantaoConfig = Figment::new()
        .merge(Serialized::defaults(PlantaoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()?;
    apply_well_known_env(&mut config);
    Ok(config)
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PLANTAO_BACKEND_GET_SCHEDULE_URL`
/// must map to `backend.get_schedule_url`, not `backend.get.schedule.url`.
fn env_provider() -> Env {
    Env::prefixed("PLANTAO_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("webhook_", "webhook.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("engine_", "engine.", 1);
        mapped.into()
    })
}

/// Honor the operational variables the deployment environment already sets.
/// Each one fills its field only when the layered config left it unset (or at
/// its compiled default, for the scalar knobs).
fn apply_well_known_env(config: &mut PlantaoConfig) {
    fn var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    if config.llm.api_key.is_none() {
        config.llm.api_key = var("OPENAI_API_KEY");
    }
    if let Some(model) = var("INTENT_MODEL") {
        config.llm.intent_model = model;
    }
    if let Some(model) = var("EXTRACTOR_MODEL") {
        config.llm.extractor_model = model;
    }
    if config.backend.get_schedule_url.is_none() {
        config.backend.get_schedule_url = var("LAMBDA_GET_SCHEDULE");
    }
    if config.backend.update_schedule_url.is_none() {
        config.backend.update_schedule_url = var("LAMBDA_UPDATE_SCHEDULE");
    }
    if config.backend.update_clinical_url.is_none() {
        config.backend.update_clinical_url = var("LAMBDA_UPDATE_CLINICAL");
    }
    if config.backend.update_summary_url.is_none() {
        config.backend.update_summary_url = var("LAMBDA_UPDATE_SUMMARY");
    }
    if config.backend.get_note_report_url.is_none() {
        config.backend.get_note_report_url = var("LAMBDA_GET_NOTE_REPORT");
    }
    if config.webhook.url.is_none() {
        config.webhook.url = var("N8N_WEBHOOK_URL");
    }
    if let Some(timeout) = var("TIMEOUT_LAMBDAS").and_then(|v| v.parse().ok()) {
        config.backend.timeout_secs = timeout;
    }
    if let Some(retries) = var("MAX_RETRIES").and_then(|v| v.parse().ok()) {
        config.backend.max_retries = retries;
    }
    if let Some(level) = var("LOG_LEVEL") {
        config.agent.log_level = level;
    }
}

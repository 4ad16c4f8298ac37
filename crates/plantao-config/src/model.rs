// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plantão orchestrator.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plantão configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlantaoConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Shift backend endpoints.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Workflow webhook settings.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP ingress settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Engine tuning: locks, OCC retries, deadlines, TTLs.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "plantao".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// LLM provider configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat-completions endpoint.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model for classification calls (intent, confirmation, operational).
    #[serde(default = "default_intent_model")]
    pub intent_model: String,

    /// Model for extraction and reply generation.
    #[serde(default = "default_extractor_model")]
    pub extractor_model: String,

    /// Hard cap per call, seconds.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Re-parse retries on malformed JSON.
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            intent_model: default_intent_model(),
            extractor_model: default_extractor_model(),
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_retries(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_intent_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_extractor_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    10
}

fn default_llm_retries() -> u32 {
    2
}

/// Shift backend endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// `getScheduleStarted` endpoint.
    #[serde(default)]
    pub get_schedule_url: Option<String>,

    /// `updateWorkScheduleResponse` endpoint.
    #[serde(default)]
    pub update_schedule_url: Option<String>,

    /// `updateClinicalData` endpoint.
    #[serde(default)]
    pub update_clinical_url: Option<String>,

    /// `updatereportsummaryad` endpoint.
    #[serde(default)]
    pub update_summary_url: Option<String>,

    /// `getNoteReport` endpoint.
    #[serde(default)]
    pub get_note_report_url: Option<String>,

    /// Per-call timeout, seconds.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry budget on transient errors.
    #[serde(default = "default_backend_retries")]
    pub max_retries: u32,
}

fn default_backend_timeout_secs() -> u64 {
    30
}

fn default_backend_retries() -> u32 {
    3
}

/// Workflow webhook configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Webhook URL that persists clinical/operational payloads downstream.
    #[serde(default)]
    pub url: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "plantao.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP ingress configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Engine tuning parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Overall per-request deadline, seconds.
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,

    /// Session lock lease, milliseconds.
    #[serde(default = "default_lock_lease_ms")]
    pub lock_lease_ms: i64,

    /// Bounded lock acquisition attempts.
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,

    /// Bounded reload-and-replay attempts on OCC conflict.
    #[serde(default = "default_occ_retries")]
    pub occ_retries: u32,

    /// Idempotency record TTL, seconds.
    #[serde(default = "default_idempotency_ttl_secs")]
    pub idempotency_ttl_secs: i64,

    /// Conversation buffer TTL, seconds.
    #[serde(default = "default_buffer_ttl_secs")]
    pub buffer_ttl_secs: i64,

    /// Confirmation window of a staged action, minutes.
    #[serde(default = "default_action_expiry_minutes")]
    pub action_expiry_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_deadline_secs: default_request_deadline_secs(),
            lock_lease_ms: default_lock_lease_ms(),
            lock_retries: default_lock_retries(),
            occ_retries: default_occ_retries(),
            idempotency_ttl_secs: default_idempotency_ttl_secs(),
            buffer_ttl_secs: default_buffer_ttl_secs(),
            action_expiry_minutes: default_action_expiry_minutes(),
        }
    }
}

fn default_request_deadline_secs() -> u64 {
    45
}

fn default_lock_lease_ms() -> i64 {
    10_000
}

fn default_lock_retries() -> u32 {
    3
}

fn default_occ_retries() -> u32 {
    3
}

fn default_idempotency_ttl_secs() -> i64 {
    600
}

fn default_buffer_ttl_secs() -> i64 {
    7 * 24 * 3600
}

fn default_action_expiry_minutes() -> i64 {
    10
}

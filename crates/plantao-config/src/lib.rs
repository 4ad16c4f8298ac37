// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for the Plantão orchestrator.
//!
//! TOML files merged over compiled defaults, `PLANTAO_*` environment
//! overrides, and fallbacks for the operational variables the deployment
//! already exports (`OPENAI_API_KEY`, `LAMBDA_*`, `N8N_WEBHOOK_URL`, ...).

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PlantaoConfig;

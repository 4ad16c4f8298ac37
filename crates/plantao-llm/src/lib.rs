// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM gateway for the Plantão orchestrator.
//!
//! Six strictly-typed calls over an OpenAI-compatible chat-completions API:
//! intent classification, confirmation classification, operational-note
//! detection, clinical extraction, finalization-topic extraction and reply
//! generation. Temperature 0 everywhere, schema validation on every response,
//! bounded re-parse retries and a circuit breaker that degrades to
//! `LlmUnavailable` while open.

pub mod client;
pub mod gateway;
pub mod prompts;
pub mod types;

pub use client::ChatClient;
pub use gateway::OpenAiGateway;

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration engine for the Plantão shift platform.
//!
//! Turns one caregiver message into one reply: idempotent intake, per-session
//! lock, optimistic-concurrency state writes, the subgraph state machines
//! (attendance, clinical, operational, finalization, help) and the fiscal
//! consolidator that renders the outcome for WhatsApp.

pub mod bootstrap;
pub mod engine;
pub mod fiscal;
pub mod subgraphs;
pub mod tpc;

pub use engine::{
    Engine, EngineResponse, IngestRequest, IngestResponse, TemplateEvent, TemplateMetadata,
};

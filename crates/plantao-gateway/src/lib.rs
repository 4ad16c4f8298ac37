// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP ingress for the Plantão orchestrator.
//!
//! One webhook for caregiver messages, one hook for template-fired
//! notifications, plus liveness and readiness probes. Idempotency and
//! per-session locking live in the engine; the gateway only maps transport.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState, ServerConfig};

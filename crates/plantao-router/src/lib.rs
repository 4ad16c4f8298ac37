// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic routing for the Plantão orchestrator.
//!
//! A fixed gate ladder selects one subgraph per message; a keyword fast-path
//! resolves clear confirmations without paying for an LLM call.

pub mod confirm;
pub mod router;

pub use confirm::quick_confirmation;
pub use router::{route, Gate, RouteDecision};

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic clinical validation for the Plantão orchestrator.
//!
//! The LLM extracts; this crate decides. Safety ranges, blood-pressure
//! normalization, respiratory-mode mapping, and the commit-readiness rules
//! (including the first-complete-measurement requirement) all live here and
//! run on every path regardless of what the model returned.

pub mod pa;
pub mod ranges;
pub mod respiratory;
pub mod validator;

pub use pa::{normalize_pa, PaParse, PA_AMBIGUOUS_WARNING, PA_INVALID_WARNING};
pub use respiratory::parse_respiratory_mode;
pub use validator::{commit_readiness, sanitize, CommitReadiness, DEFAULT_NOTE};

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mocks and fixtures for Plantão tests.
//!
//! `MockLlm` scripts the six typed gateway calls; `MockBackend` records every
//! backend interaction; fixtures build the common session states the
//! scenarios start from. Everything runs in-process and CI-friendly.

pub mod fixtures;
pub mod mock_backend;
pub mod mock_llm;

pub use fixtures::{
    awaiting_attendance_state, confirmed_schedule, confirmed_state, full_extraction,
    pending_schedule,
};
pub use mock_backend::{BackendCall, FailMode, MockBackend};
pub use mock_llm::MockLlm;

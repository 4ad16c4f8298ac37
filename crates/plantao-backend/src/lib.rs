// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend adapter for the Plantão orchestrator.
//!
//! One function per backend endpoint (`getScheduleStarted`,
//! `updateWorkScheduleResponse`, `updateClinicalData`, `updatereportsummaryad`,
//! `getNoteReport`) plus the workflow webhook. Every endpoint gets a per-call
//! timeout, a bounded exponential-backoff retry, and its own circuit breaker.

pub mod adapter;
pub mod client;
pub mod error;

pub use adapter::HttpShiftBackend;
pub use error::BackendError;

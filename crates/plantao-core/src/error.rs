// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plantão orchestration engine.

use thiserror::Error;

/// The primary error type used across all Plantão adapter traits and core operations.
///
/// Subgraphs never surface these through the HTTP boundary directly; the
/// engine maps every failure into an outcome code that the consolidator
/// renders for the caregiver.
#[derive(Debug, Error)]
pub enum PlantaoError {
    /// Malformed caller input (bad phone number, empty text, invalid header).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic-concurrency conflict: stored version differs from the expected one.
    #[error("version conflict for {session_id} (expected {expected})")]
    Conflict { session_id: String, expected: i64 },

    /// Per-session lock could not be acquired within the retry budget.
    #[error("lock denied for {resource}")]
    LockDenied { resource: String },

    /// LLM gateway circuit is open or the provider is unreachable.
    #[error("llm unavailable: {0}")]
    LlmUnavailable(String),

    /// LLM call failed (API error, schema violation after retries).
    #[error("llm error: {message}")]
    Llm {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backend call failed with a retryable condition; the staged action survives.
    #[error("backend transient failure: {0}")]
    BackendTransient(String),

    /// Backend call failed permanently; the staged action is discarded.
    #[error("backend permanent failure: {0}")]
    BackendPermanent(String),

    /// Operation exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Bug-class: the engine observed a state the invariants forbid.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlantaoError {
    /// True for errors a caller may retry verbatim (everything but `Conflict`,
    /// which requires reload-and-replay, and the permanent classes).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlantaoError::Storage { .. }
                | PlantaoError::LockDenied { .. }
                | PlantaoError::BackendTransient(_)
                | PlantaoError::Timeout { .. }
                | PlantaoError::LlmUnavailable(_)
        )
    }

    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PlantaoError::Storage {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_not_retryable() {
        let err = PlantaoError::Conflict {
            session_id: "5511999999999".into(),
            expected: 3,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn transient_classes_are_retryable() {
        assert!(PlantaoError::BackendTransient("503".into()).is_retryable());
        assert!(PlantaoError::LockDenied {
            resource: "session:1".into()
        }
        .is_retryable());
        assert!(PlantaoError::Timeout {
            duration: std::time::Duration::from_secs(45)
        }
        .is_retryable());
    }

    #[test]
    fn display_includes_context() {
        let err = PlantaoError::LockDenied {
            resource: "session:5511988887777".into(),
        };
        assert!(err.to_string().contains("session:5511988887777"));
    }
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured backend error kinds, mapped into the shared taxonomy at the seam.

use plantao_core::PlantaoError;
use thiserror::Error;

/// What went wrong talking to a backend endpoint.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The call exceeded its per-call timeout.
    #[error("backend call to {endpoint} timed out")]
    Timeout { endpoint: &'static str },

    /// Retryable condition (connect errors, 429, 5xx within the retry budget).
    #[error("transient backend failure on {endpoint}: {message}")]
    Transient {
        endpoint: &'static str,
        message: String,
    },

    /// Client-side contract violation; retrying cannot help.
    #[error("backend rejected {endpoint} with {status}: {message}")]
    Permanent4xx {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    /// Server-side failure that survived the retry budget.
    #[error("backend failed {endpoint} with {status}: {message}")]
    Permanent5xx {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    /// The endpoint's circuit is open; no call was attempted.
    #[error("circuit open for {endpoint}")]
    CircuitOpen { endpoint: &'static str },
}

impl From<BackendError> for PlantaoError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout { .. } => PlantaoError::Timeout {
                duration: std::time::Duration::from_secs(30),
            },
            // An open circuit behaves like a transient outage: the staged
            // action survives and the caregiver may retry.
            BackendError::Transient { .. } | BackendError::CircuitOpen { .. } => {
                PlantaoError::BackendTransient(err.to_string())
            }
            BackendError::Permanent4xx { .. } | BackendError::Permanent5xx { .. } => {
                PlantaoError::BackendPermanent(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_into_shared_taxonomy() {
        let err: PlantaoError = BackendError::Transient {
            endpoint: "updateClinicalData",
            message: "503".into(),
        }
        .into();
        assert!(matches!(err, PlantaoError::BackendTransient(_)));

        let err: PlantaoError = BackendError::Permanent4xx {
            endpoint: "updateClinicalData",
            status: 422,
            message: "bad payload".into(),
        }
        .into();
        assert!(matches!(err, PlantaoError::BackendPermanent(_)));

        let err: PlantaoError = BackendError::CircuitOpen {
            endpoint: "getScheduleStarted",
        }
        .into();
        assert!(matches!(err, PlantaoError::BackendTransient(_)));
    }
}

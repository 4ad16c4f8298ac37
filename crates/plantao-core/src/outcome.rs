// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome codes returned by subgraphs and rendered by the consolidator.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Typed result of a subgraph turn. Every engine turn produces exactly one;
/// errors are mapped into the `*_failed` variants instead of crossing the
/// HTTP boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutcomeCode {
    EscalaStaged,
    EscalaConfirmed,
    EscalaCancelled,
    EscalaCommitFailed,

    ClinicalMissing,
    ClinicalStaged,
    ClinicalCommitted,
    ClinicalNoteOnlyCommitted,
    ClinicalRejectedIncompleteFirst,
    ClinicalCancelled,
    ClinicalCommitFailed,

    OperationalDelivered,
    OperationalDeliveryFailed,

    FinalizeTopicCollected,
    FinalizeStaged,
    FinalizeCommitted,
    FinalizeCancelled,
    FinalizeCommitFailed,

    HelpGeneric,
    HelpContext,
    ConfirmationPending,
    NoShiftFound,
}

impl OutcomeCode {
    /// Outcomes that leave a staged action waiting for the caregiver.
    pub fn awaits_confirmation(self) -> bool {
        matches!(
            self,
            OutcomeCode::EscalaStaged
                | OutcomeCode::ClinicalStaged
                | OutcomeCode::FinalizeStaged
                | OutcomeCode::ConfirmationPending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_round_trip() {
        assert_eq!(
            OutcomeCode::ClinicalNoteOnlyCommitted.to_string(),
            "clinical_note_only_committed"
        );
        assert_eq!(
            "escala_commit_failed".parse::<OutcomeCode>().unwrap(),
            OutcomeCode::EscalaCommitFailed
        );
    }

    #[test]
    fn staged_outcomes_await_confirmation() {
        assert!(OutcomeCode::ClinicalStaged.awaits_confirmation());
        assert!(!OutcomeCode::ClinicalCommitted.awaits_confirmation());
    }
}

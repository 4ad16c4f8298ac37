// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Help subgraph: stateless, points the caregiver at the next useful step.

use plantao_core::outcome::OutcomeCode;
use plantao_core::state::SessionState;

use super::SubgraphOutcome;

pub fn run(state: &SessionState) -> SubgraphOutcome {
    if !state.shift.is_hydrated() {
        return SubgraphOutcome::new(OutcomeCode::NoShiftFound);
    }

    if state.shift.attendance_pending() {
        return SubgraphOutcome::with_hint(
            OutcomeCode::HelpContext,
            "Antes de registrar dados, confirme sua presença no plantão.",
        );
    }

    if state.clinical.measurement_in_progress && !state.clinical.vitals.is_complete() {
        let missing = state.clinical.vitals.missing();
        return SubgraphOutcome::with_hint(
            OutcomeCode::HelpContext,
            format!("A aferição está incompleta. Faltam: {}.", missing.join(", ")),
        );
    }

    if state.shift.finish_reminder_sent && !state.finalization.topics.is_complete() {
        return SubgraphOutcome::with_hint(
            OutcomeCode::HelpContext,
            format!(
                "O fechamento do plantão está em andamento; faltam {} tópicos do relatório.",
                state.finalization.topics.missing().len()
            ),
        );
    }

    SubgraphOutcome::new(OutcomeCode::HelpGeneric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_test_utils::{awaiting_attendance_state, confirmed_state};

    #[test]
    fn unhydrated_session_reports_no_shift() {
        let state = SessionState::new("s1");
        assert_eq!(run(&state).code, OutcomeCode::NoShiftFound);
    }

    #[test]
    fn attendance_pending_hint() {
        let state = awaiting_attendance_state("s1");
        let outcome = run(&state);
        assert_eq!(outcome.code, OutcomeCode::HelpContext);
        assert!(outcome.hint.contains("presença"));
    }

    #[test]
    fn inflight_measurement_lists_missing_vitals() {
        let mut state = confirmed_state("s1");
        state.clinical.measurement_in_progress = true;
        state.clinical.vitals.pa = Some("120x80".into());
        let outcome = run(&state);
        assert_eq!(outcome.code, OutcomeCode::HelpContext);
        assert!(outcome.hint.contains("FC"));
        assert!(!outcome.hint.contains("PA,"));
    }

    #[test]
    fn quiet_session_gets_generic_help() {
        let state = confirmed_state("s1");
        assert_eq!(run(&state).code, OutcomeCode::HelpGeneric);
    }
}

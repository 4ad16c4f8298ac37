// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session hydration: seeding shift context from `getScheduleStarted`.

use tracing::{info, warn};

use plantao_core::backend::ScheduleInfo;
use plantao_core::state::SessionState;
use plantao_core::types::mask_phone;
use plantao_core::{PlantaoError, ShiftBackend};

/// Merge a fetched schedule into the session.
pub fn apply_schedule(state: &mut SessionState, info: ScheduleInfo) {
    state.shift.schedule_id = info.schedule_id;
    state.shift.patient_id = info.patient_id;
    state.shift.patient_name = info.patient_name;
    state.shift.report_id = info.report_id;
    state.shift.report_date = info.report_date;
    state.shift.shift_day = info.shift_day;
    state.shift.shift_start = info.shift_start;
    state.shift.shift_end = info.shift_end;
    state.shift.shift_allow = info.shift_allow;
    state.shift.response = info.response;
    state.shift.schedule_started = info.schedule_started;
    state.shift.finish_reminder_sent = info.finish_reminder_sent;
    if info.caregiver_id.is_some() {
        state.caregiver_id = info.caregiver_id;
    }
    if info.caregiver_name.is_some() {
        state.caregiver_name = info.caregiver_name;
    }
    if info.company.is_some() {
        state.company = info.company;
    }
    if info.cooperative.is_some() {
        state.cooperative = info.cooperative;
    }
}

/// Hydrate when the shift context is absent. Backend failures degrade
/// gracefully: the session proceeds unhydrated and the auxiliar flow reports
/// the inability to identify a shift.
///
/// Returns whether the session is hydrated afterwards.
pub async fn ensure_bootstrap(
    state: &mut SessionState,
    backend: &dyn ShiftBackend,
) -> Result<bool, PlantaoError> {
    if state.shift.is_hydrated() {
        return Ok(true);
    }
    match backend.get_schedule_started(&state.phone_number).await {
        Ok(info) => {
            apply_schedule(state, info);
            info!(
                phone = %mask_phone(&state.phone_number),
                schedule = state.shift.schedule_id.as_deref().unwrap_or("-"),
                shift_allow = state.shift.shift_allow,
                "session bootstrapped"
            );
            Ok(state.shift.is_hydrated())
        }
        Err(err) => {
            warn!(
                phone = %mask_phone(&state.phone_number),
                error = %err,
                "bootstrap failed, proceeding without shift context"
            );
            Ok(false)
        }
    }
}

/// Unconditional re-hydration after a commit changed the shift on the backend
/// side. Failures are logged and ignored; the next message retries.
pub async fn rehydrate(state: &mut SessionState, backend: &dyn ShiftBackend) {
    match backend.get_schedule_started(&state.phone_number).await {
        Ok(info) => apply_schedule(state, info),
        Err(err) => {
            warn!(error = %err, "re-hydration after commit failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_test_utils::{pending_schedule, MockBackend};

    #[tokio::test]
    async fn bootstrap_populates_shift_context() {
        let backend = MockBackend::new().with_schedule(pending_schedule());
        let mut state = SessionState::new("5511999999999");

        let hydrated = ensure_bootstrap(&mut state, &backend).await.unwrap();
        assert!(hydrated);
        assert_eq!(state.shift.schedule_id.as_deref(), Some("sch-1"));
        assert_eq!(state.caregiver_name.as_deref(), Some("Maria"));
        assert!(state.shift.attendance_pending());
    }

    #[tokio::test]
    async fn hydrated_sessions_skip_the_backend() {
        let backend = MockBackend::new().with_schedule(pending_schedule());
        let mut state = SessionState::new("5511999999999");
        ensure_bootstrap(&mut state, &backend).await.unwrap();
        ensure_bootstrap(&mut state, &backend).await.unwrap();
        // Only the first call reached the backend.
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_schedule_leaves_session_unhydrated() {
        let backend = MockBackend::new();
        let mut state = SessionState::new("5511999999999");
        let hydrated = ensure_bootstrap(&mut state, &backend).await.unwrap();
        assert!(!hydrated);
        assert!(state.shift.schedule_id.is_none());
    }
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-state and schedule fixtures shared across crate tests.

use plantao_core::backend::ScheduleInfo;
use plantao_core::llm::ClinicalExtraction;
use plantao_core::state::{RespiratoryMode, SessionState, ShiftResponse};

/// A hydrated session still waiting for the attendance answer.
pub fn awaiting_attendance_state(session_id: &str) -> SessionState {
    let mut state = SessionState::new(session_id);
    state.caregiver_id = Some("cg-1".into());
    state.caregiver_name = Some("Maria".into());
    state.shift.schedule_id = Some("sch-1".into());
    state.shift.patient_id = Some("pat-1".into());
    state.shift.patient_name = Some("Sr. João".into());
    state.shift.report_id = Some("rep-1".into());
    state.shift.report_date = Some("2026-08-02".into());
    state.shift.shift_day = Some("2026-08-02".into());
    state.shift.shift_start = Some("07:00".into());
    state.shift.shift_end = Some("19:00".into());
    state.shift.shift_allow = true;
    state.shift.response = ShiftResponse::AguardandoResposta;
    state
}

/// A session with confirmed presence, ready for clinical flows.
pub fn confirmed_state(session_id: &str) -> SessionState {
    let mut state = awaiting_attendance_state(session_id);
    state.shift.response = ShiftResponse::Confirmado;
    state
}

/// The schedule the backend returns for [`awaiting_attendance_state`].
pub fn pending_schedule() -> ScheduleInfo {
    ScheduleInfo {
        schedule_id: Some("sch-1".into()),
        patient_id: Some("pat-1".into()),
        patient_name: Some("Sr. João".into()),
        report_id: Some("rep-1".into()),
        report_date: Some("2026-08-02".into()),
        shift_day: Some("2026-08-02".into()),
        shift_start: Some("07:00".into()),
        shift_end: Some("19:00".into()),
        shift_allow: true,
        response: ShiftResponse::AguardandoResposta,
        schedule_started: true,
        finish_reminder_sent: false,
        caregiver_id: Some("cg-1".into()),
        caregiver_name: Some("Maria".into()),
        company: Some("CuidarBem".into()),
        cooperative: Some("Coop Zona Sul".into()),
    }
}

/// Same schedule after the caregiver confirmed presence.
pub fn confirmed_schedule() -> ScheduleInfo {
    ScheduleInfo {
        response: ShiftResponse::Confirmado,
        ..pending_schedule()
    }
}

/// A complete first-measurement extraction.
pub fn full_extraction() -> ClinicalExtraction {
    ClinicalExtraction {
        pa: Some("120x80".into()),
        hr: Some(78),
        rr: Some(18),
        sat_o2: Some(97),
        temp: Some(36.8),
        respiratory_mode: Some(RespiratoryMode::Ambient),
        clinical_note: Some("paciente estável".into()),
        warnings: vec![],
    }
}

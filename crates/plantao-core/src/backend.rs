// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract shapes of the shift backend endpoints and the workflow webhook.

use serde::{Deserialize, Serialize};

use crate::state::ShiftResponse;

/// Response of `getScheduleStarted`: the shift context seeded into a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleInfo {
    pub schedule_id: Option<String>,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub report_id: Option<String>,
    pub report_date: Option<String>,
    pub shift_day: Option<String>,
    pub shift_start: Option<String>,
    pub shift_end: Option<String>,
    pub shift_allow: bool,
    pub response: ShiftResponse,
    pub schedule_started: bool,
    pub finish_reminder_sent: bool,
    pub caregiver_id: Option<String>,
    pub caregiver_name: Option<String>,
    pub company: Option<String>,
    pub cooperative: Option<String>,
}

/// Request of `updateWorkScheduleResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponseUpdate {
    pub schedule_identifier: String,
    /// `"confirmado"` or `"cancelado"`.
    pub response_value: String,
    /// Staged-action UUID, carried for backend-side idempotency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

/// The seven accepted shapes of `updateClinicalData`, by which fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinicalScenario {
    VitalSignsNoteSymptoms,
    VitalSignsSymptoms,
    VitalSignsNote,
    VitalSignsOnly,
    NoteSymptoms,
    SymptomsOnly,
    NoteOnly,
}

/// Request of `updateClinicalData` (and envelope of the clinical webhook
/// payload, which adds `sessionID`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicalDataUpdate {
    #[serde(rename = "reportID")]
    pub report_id: String,
    pub report_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caregiver_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_rate: Option<i32>,
    #[serde(rename = "saturationO2", skip_serializing_if = "Option::is_none")]
    pub saturation_o2: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplementary_oxygen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_concentrator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_note: Option<String>,
    /// Symptom reports resolved downstream; forwarded opaquely when present.
    #[serde(rename = "SymptomReport", skip_serializing_if = "Option::is_none")]
    pub symptom_report: Option<Vec<serde_json::Value>>,
    /// Staged-action UUID, carried for backend-side idempotency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

impl ClinicalDataUpdate {
    /// Which of the seven scenarios this payload represents.
    pub fn scenario(&self) -> ClinicalScenario {
        let has_vitals = self.heart_rate.is_some()
            || self.resp_rate.is_some()
            || self.saturation_o2.is_some()
            || self.blood_pressure.is_some()
            || self.temperature.is_some();
        let has_note = self.clinical_note.is_some();
        let has_symptoms = self
            .symptom_report
            .as_ref()
            .is_some_and(|reports| !reports.is_empty());
        match (has_vitals, has_note, has_symptoms) {
            (true, true, true) => ClinicalScenario::VitalSignsNoteSymptoms,
            (true, false, true) => ClinicalScenario::VitalSignsSymptoms,
            (true, true, false) => ClinicalScenario::VitalSignsNote,
            (true, false, false) => ClinicalScenario::VitalSignsOnly,
            (false, true, true) => ClinicalScenario::NoteSymptoms,
            (false, false, true) => ClinicalScenario::SymptomsOnly,
            (false, _, false) => ClinicalScenario::NoteOnly,
        }
    }
}

/// Request of `updatereportsummaryad`: the final shift report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSummaryUpdate {
    #[serde(rename = "reportID")]
    pub report_id: String,
    pub report_date: String,
    #[serde(rename = "scheduleID")]
    pub schedule_id: String,
    pub patient_first_name: String,
    pub shift_day: String,
    pub shift_start: String,
    pub shift_end: String,
    pub caregiver_first_name: String,
    #[serde(rename = "caregiverID")]
    pub caregiver_id: String,
    pub food_hydration_specification: String,
    pub stool_urine_specification: String,
    pub sleep_specification: String,
    pub mood_specification: String,
    pub medications_specification: String,
    pub activities_specification: String,
    pub additional_information_specification: String,
    pub administrative_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

/// One note returned by `getNoteReport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftNote {
    #[serde(rename = "noteDescAI")]
    pub note_desc_ai: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical session state schema.
//!
//! One `SessionState` exists per caregiver phone number. The store versions
//! it externally (optimistic concurrency); nothing outside the session lock
//! may mutate it. The original system kept this as loose dictionaries — here
//! every field is explicit and validated at the serde boundary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{ActionFlow, Flow, PendingAction};

/// Caregiver answer to the current shift, as the backend stores it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
pub enum ShiftResponse {
    #[default]
    #[strum(serialize = "")]
    #[serde(rename = "")]
    Empty,
    #[strum(serialize = "confirmado")]
    #[serde(rename = "confirmado")]
    Confirmado,
    #[strum(serialize = "aguardando resposta")]
    #[serde(rename = "aguardando resposta")]
    AguardandoResposta,
    #[strum(serialize = "cancelado")]
    #[serde(rename = "cancelado")]
    Cancelado,
}

/// Respiratory support condition attached to a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespiratoryMode {
    Ambient,
    SupplementalO2,
    MechanicalVentilation,
}

impl RespiratoryMode {
    /// The wording the clinical backend and webhook expect.
    pub fn payload_label(self) -> &'static str {
        match self {
            RespiratoryMode::Ambient => "Ar ambiente",
            RespiratoryMode::SupplementalO2 => "Oxigênio suplementar",
            RespiratoryMode::MechanicalVentilation => "Ventilação mecânica",
        }
    }
}

/// Shift context hydrated from the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftContext {
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
}

impl ShiftContext {
    /// The attendance gate holds while the shift is allowed but presence is
    /// not yet confirmed.
    pub fn attendance_pending(&self) -> bool {
        self.shift_allow && self.response != ShiftResponse::Confirmado
    }

    pub fn is_hydrated(&self) -> bool {
        self.schedule_id.is_some() && self.report_id.is_some()
    }
}

/// The five vitals of a measurement. All optional while collection is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Blood pressure, normalized `SSSxDDD` (e.g. `120x80`).
    pub pa: Option<String>,
    /// Heart rate, bpm.
    pub hr: Option<i32>,
    /// Respiratory rate, rpm.
    pub rr: Option<i32>,
    /// Oxygen saturation, percent.
    pub sat_o2: Option<i32>,
    /// Temperature, Celsius.
    pub temp: Option<f64>,
}

/// Display labels of the five vitals, in collection order.
pub const VITAL_LABELS: [&str; 5] = ["PA", "FC", "FR", "Sat", "Temp"];

impl Vitals {
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Labels of the vitals still absent.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pa.is_none() {
            missing.push("PA");
        }
        if self.hr.is_none() {
            missing.push("FC");
        }
        if self.rr.is_none() {
            missing.push("FR");
        }
        if self.sat_o2.is_none() {
            missing.push("Sat");
        }
        if self.temp.is_none() {
            missing.push("Temp");
        }
        missing
    }

    pub fn is_empty(&self) -> bool {
        self.missing().len() == VITAL_LABELS.len()
    }

    /// Merge newly extracted values: incoming non-null values fill nulls and
    /// refresh prior values; nulls never erase anything.
    pub fn merge(&mut self, incoming: &Vitals) {
        if incoming.pa.is_some() {
            self.pa = incoming.pa.clone();
        }
        if incoming.hr.is_some() {
            self.hr = incoming.hr;
        }
        if incoming.rr.is_some() {
            self.rr = incoming.rr;
        }
        if incoming.sat_o2.is_some() {
            self.sat_o2 = incoming.sat_o2;
        }
        if incoming.temp.is_some() {
            self.temp = incoming.temp;
        }
    }

    /// Short human summary for confirmation prompts, e.g.
    /// `PA 120x80, FC 78 bpm, Sat 97%`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(pa) = &self.pa {
            parts.push(format!("PA {pa}"));
        }
        if let Some(hr) = self.hr {
            parts.push(format!("FC {hr} bpm"));
        }
        if let Some(rr) = self.rr {
            parts.push(format!("FR {rr} irpm"));
        }
        if let Some(sat) = self.sat_o2 {
            parts.push(format!("Sat {sat}%"));
        }
        if let Some(temp) = self.temp {
            parts.push(format!("Temp {temp}°C"));
        }
        parts.join(", ")
    }
}

/// In-flight clinical collection for the current measurement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalBuffer {
    pub vitals: Vitals,
    pub respiratory_mode: Option<RespiratoryMode>,
    pub clinical_note: Option<String>,
    /// Once true, later measurements may omit the note and standalone notes
    /// commit directly.
    pub first_complete_measurement_done: bool,
    /// Set when any vitals arrive; a later lone note then joins the
    /// measurement instead of committing note-only.
    pub measurement_in_progress: bool,
}

impl ClinicalBuffer {
    /// Reset the collection, preserving the per-shift first-measurement flag.
    pub fn clear_measurement(&mut self) {
        let done = self.first_complete_measurement_done;
        *self = ClinicalBuffer {
            first_complete_measurement_done: done,
            ..ClinicalBuffer::default()
        };
    }
}

/// The eight finalization topics of the shift report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalizationTopics {
    pub alimentacao: Option<String>,
    pub evacuacoes: Option<String>,
    pub sono: Option<String>,
    pub humor: Option<String>,
    pub medicacoes: Option<String>,
    pub atividades: Option<String>,
    pub adicional_clinico: Option<String>,
    pub adicional_administrativo: Option<String>,
}

/// Topic keys in collection order, paired with the prompt wording.
pub const TOPIC_LABELS: [(&str, &str); 8] = [
    ("alimentacao", "Alimentação e Hidratação"),
    ("evacuacoes", "Evacuações"),
    ("sono", "Sono"),
    ("humor", "Humor"),
    ("medicacoes", "Medicações"),
    ("atividades", "Atividades"),
    ("adicional_clinico", "Informações Clínicas Adicionais"),
    ("adicional_administrativo", "Informações Administrativas"),
];

impl FinalizationTopics {
    pub fn get(&self, key: &str) -> Option<&String> {
        match key {
            "alimentacao" => self.alimentacao.as_ref(),
            "evacuacoes" => self.evacuacoes.as_ref(),
            "sono" => self.sono.as_ref(),
            "humor" => self.humor.as_ref(),
            "medicacoes" => self.medicacoes.as_ref(),
            "atividades" => self.atividades.as_ref(),
            "adicional_clinico" => self.adicional_clinico.as_ref(),
            "adicional_administrativo" => self.adicional_administrativo.as_ref(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        let slot = match key {
            "alimentacao" => &mut self.alimentacao,
            "evacuacoes" => &mut self.evacuacoes,
            "sono" => &mut self.sono,
            "humor" => &mut self.humor,
            "medicacoes" => &mut self.medicacoes,
            "atividades" => &mut self.atividades,
            "adicional_clinico" => &mut self.adicional_clinico,
            "adicional_administrativo" => &mut self.adicional_administrativo,
            _ => return,
        };
        *slot = Some(value);
    }

    /// Keys of topics still unfilled, in collection order.
    pub fn missing(&self) -> Vec<&'static str> {
        TOPIC_LABELS
            .iter()
            .filter(|(key, _)| self.get(key).is_none())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Finalization collection state for a closing shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalizationBuffer {
    pub topics: FinalizationTopics,
    /// Notes already recorded during the shift, fetched once on entry.
    pub existing_notes: Vec<String>,
    pub notes_seeded: bool,
}

/// A diverted flow to resume after a prerequisite is satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeAfter {
    pub flow: Flow,
    pub reason: String,
}

/// Canonical per-session state, created lazily on first message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub phone_number: String,
    pub caregiver_id: Option<String>,
    pub caregiver_name: Option<String>,
    pub company: Option<String>,
    pub cooperative: Option<String>,

    #[serde(default)]
    pub shift: ShiftContext,
    #[serde(default)]
    pub clinical: ClinicalBuffer,
    #[serde(default)]
    pub finalization: FinalizationBuffer,

    pub pending_action: Option<PendingAction>,
    pub resume_after: Option<ResumeAfter>,
    pub last_user_text: Option<String>,
    pub last_reply_code: Option<String>,
    /// RFC 3339 timestamp of the last successful write.
    pub updated_at: Option<String>,
}

impl SessionState {
    /// Default state for a session that has no stored record yet.
    pub fn new(session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        SessionState {
            phone_number: session_id.clone(),
            session_id,
            caregiver_id: None,
            caregiver_name: None,
            company: None,
            cooperative: None,
            shift: ShiftContext::default(),
            clinical: ClinicalBuffer::default(),
            finalization: FinalizationBuffer::default(),
            pending_action: None,
            resume_after: None,
            last_user_text: None,
            last_reply_code: None,
            updated_at: None,
        }
    }

    /// The staged action awaiting confirmation, if one exists and has not expired.
    pub fn staged_action(&self, now_epoch: i64) -> Option<&PendingAction> {
        self.pending_action
            .as_ref()
            .filter(|a| a.is_awaiting_confirmation(now_epoch))
    }

    /// Drop an expired pending action so it never consumes a confirmation.
    pub fn prune_expired_action(&mut self, now_epoch: i64) {
        if let Some(action) = &self.pending_action {
            if action.is_expired(now_epoch) {
                self.pending_action = None;
            }
        }
    }

    /// Clear the per-shift buffers after a successful finalize commit.
    /// Identity and shift context remain for re-hydration.
    pub fn reset_after_finalization(&mut self) {
        self.clinical = ClinicalBuffer::default();
        self.finalization = FinalizationBuffer::default();
        self.pending_action = None;
        self.resume_after = None;
        self.shift.finish_reminder_sent = false;
    }
}

/// Compact projection of the state handed to the intent classifier.
#[derive(Debug, Clone, Serialize)]
pub struct CompactState {
    pub shift_allow: bool,
    pub response: ShiftResponse,
    pub finish_reminder_sent: bool,
    pub pending_flow: Option<ActionFlow>,
    pub missing_vitals: Vec<&'static str>,
    pub first_complete_measurement_done: bool,
}

impl CompactState {
    pub fn project(state: &SessionState) -> Self {
        CompactState {
            shift_allow: state.shift.shift_allow,
            response: state.shift.response,
            finish_reminder_sent: state.shift.finish_reminder_sent,
            pending_flow: state.pending_action.as_ref().map(|a| a.flow),
            missing_vitals: state.clinical.vitals.missing(),
            first_complete_measurement_done: state.clinical.first_complete_measurement_done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActionStatus;

    #[test]
    fn shift_response_serde_strings() {
        assert_eq!(
            serde_json::to_string(&ShiftResponse::AguardandoResposta).unwrap(),
            "\"aguardando resposta\""
        );
        let parsed: ShiftResponse = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, ShiftResponse::Empty);
    }

    #[test]
    fn attendance_pending_requires_allow_without_confirmation() {
        let mut shift = ShiftContext {
            shift_allow: true,
            response: ShiftResponse::AguardandoResposta,
            ..ShiftContext::default()
        };
        assert!(shift.attendance_pending());
        shift.response = ShiftResponse::Confirmado;
        assert!(!shift.attendance_pending());
        shift.shift_allow = false;
        assert!(!shift.attendance_pending());
    }

    #[test]
    fn vitals_missing_and_merge() {
        let mut vitals = Vitals {
            pa: Some("120x80".into()),
            ..Vitals::default()
        };
        assert_eq!(vitals.missing(), vec!["FC", "FR", "Sat", "Temp"]);

        let incoming = Vitals {
            hr: Some(78),
            sat_o2: Some(97),
            ..Vitals::default()
        };
        vitals.merge(&incoming);
        assert_eq!(vitals.missing(), vec!["FR", "Temp"]);
        // Nulls never erase previous values.
        vitals.merge(&Vitals::default());
        assert_eq!(vitals.pa.as_deref(), Some("120x80"));
    }

    #[test]
    fn clinical_clear_preserves_first_measurement_flag() {
        let mut buffer = ClinicalBuffer {
            vitals: Vitals {
                hr: Some(80),
                ..Vitals::default()
            },
            clinical_note: Some("estável".into()),
            first_complete_measurement_done: true,
            measurement_in_progress: true,
            ..ClinicalBuffer::default()
        };
        buffer.clear_measurement();
        assert!(buffer.first_complete_measurement_done);
        assert!(!buffer.measurement_in_progress);
        assert!(buffer.vitals.is_empty());
        assert!(buffer.clinical_note.is_none());
    }

    #[test]
    fn topics_missing_follows_collection_order() {
        let mut topics = FinalizationTopics::default();
        topics.set("sono", "dormiu bem".into());
        let missing = topics.missing();
        assert_eq!(missing.len(), 7);
        assert_eq!(missing[0], "alimentacao");
        assert!(!missing.contains(&"sono"));
    }

    #[test]
    fn reset_after_finalization_clears_buffers_and_flag() {
        let mut state = SessionState::new("5511999999999");
        state.shift.finish_reminder_sent = true;
        state.clinical.first_complete_measurement_done = true;
        state.finalization.topics.set("sono", "bem".into());
        state.pending_action = Some(PendingAction {
            action_id: "a".into(),
            flow: ActionFlow::FinalizeCommit,
            payload: serde_json::json!({}),
            description: "finalizar".into(),
            status: ActionStatus::Confirmed,
            created_at: "2026-01-01T00:00:00Z".into(),
            expires_at: i64::MAX,
        });

        state.reset_after_finalization();
        assert!(!state.shift.finish_reminder_sent);
        assert!(state.pending_action.is_none());
        assert!(!state.clinical.first_complete_measurement_done);
        assert!(state.finalization.topics.missing().len() == 8);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = SessionState::new("5511988887777");
        state.shift.shift_allow = true;
        state.clinical.vitals.pa = Some("130x85".into());
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, "5511988887777");
        assert_eq!(back.clinical.vitals.pa.as_deref(), Some("130x85"));
    }
}

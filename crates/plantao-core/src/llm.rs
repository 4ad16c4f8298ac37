// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed contracts of the six LLM gateway calls.
//!
//! Every call is a JSON-in/JSON-out oracle at temperature 0. The structs here
//! are the validated shapes the rest of the engine consumes; raw model output
//! never leaves the gateway crate.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::state::RespiratoryMode;
use crate::types::Flow;

/// Intent labels produced by `IntentClassify`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Escala,
    Clinico,
    Operacional,
    Finalizar,
    Auxiliar,
    Indefinido,
}

impl Intent {
    /// 1:1 mapping into subgraphs; `indefinido` lands in `auxiliar`.
    pub fn to_flow(self) -> Flow {
        match self {
            Intent::Escala => Flow::Escala,
            Intent::Clinico => Flow::Clinico,
            Intent::Operacional => Flow::Operacional,
            Intent::Finalizar => Flow::Finalizar,
            Intent::Auxiliar | Intent::Indefinido => Flow::Auxiliar,
        }
    }
}

/// Result of `IntentClassify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    /// 0.0–1.0.
    pub confidence: f32,
}

/// Result of `ConfirmationClassify` (and of the deterministic fast-path).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationVerdict {
    Yes,
    No,
    Cancel,
    Unclear,
}

/// Urgency of an operational note.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Normal,
    High,
}

/// Result of `OperationalNoteDetect`. Fires on supplies, infrastructure and
/// visitor events; never on clinical content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalNote {
    pub is_operational: bool,
    pub urgency: Urgency,
    /// The operational fragment, stripped of any clinical content.
    #[serde(default)]
    pub note: Option<String>,
}

/// Result of `ClinicalExtract`, after range validation inside the gateway.
/// Values outside the safety ranges arrive as `None` with a warning code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalExtraction {
    /// `SSSxDDD`, only when unambiguous.
    pub pa: Option<String>,
    pub hr: Option<i32>,
    pub rr: Option<i32>,
    pub sat_o2: Option<i32>,
    pub temp: Option<f64>,
    pub respiratory_mode: Option<RespiratoryMode>,
    pub clinical_note: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ClinicalExtraction {
    pub fn has_any_vital(&self) -> bool {
        self.pa.is_some()
            || self.hr.is_some()
            || self.rr.is_some()
            || self.sat_o2.is_some()
            || self.temp.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_any_vital()
            && self.respiratory_mode.is_none()
            && self.clinical_note.is_none()
    }
}

/// Partial topic filling produced by `FinalizationTopicExtract`. The
/// extractor never invents values; absent topics stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalizationExtraction {
    pub alimentacao: Option<String>,
    pub evacuacoes: Option<String>,
    pub sono: Option<String>,
    pub humor: Option<String>,
    pub medicacoes: Option<String>,
    pub atividades: Option<String>,
    pub adicional_clinico: Option<String>,
    pub adicional_administrativo: Option<String>,
}

impl FinalizationExtraction {
    /// `(key, value)` pairs for the topics this extraction filled.
    pub fn filled(&self) -> Vec<(&'static str, &String)> {
        let mut out = Vec::new();
        let pairs: [(&'static str, &Option<String>); 8] = [
            ("alimentacao", &self.alimentacao),
            ("evacuacoes", &self.evacuacoes),
            ("sono", &self.sono),
            ("humor", &self.humor),
            ("medicacoes", &self.medicacoes),
            ("atividades", &self.atividades),
            ("adicional_clinico", &self.adicional_clinico),
            ("adicional_administrativo", &self.adicional_administrativo),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                out.push((key, value));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indefinido_maps_to_auxiliar() {
        assert_eq!(Intent::Indefinido.to_flow(), Flow::Auxiliar);
        assert_eq!(Intent::Clinico.to_flow(), Flow::Clinico);
    }

    #[test]
    fn extraction_emptiness() {
        let mut extraction = ClinicalExtraction::default();
        assert!(extraction.is_empty());
        extraction.clinical_note = Some("paciente estável".into());
        assert!(!extraction.is_empty());
        assert!(!extraction.has_any_vital());
        extraction.hr = Some(78);
        assert!(extraction.has_any_vital());
    }

    #[test]
    fn finalization_filled_pairs() {
        let extraction = FinalizationExtraction {
            sono: Some("dormiu bem".into()),
            humor: Some("calmo".into()),
            ..FinalizationExtraction::default()
        };
        let filled = extraction.filled();
        assert_eq!(filled.len(), 2);
        assert_eq!(filled[0].0, "sono");
    }
}

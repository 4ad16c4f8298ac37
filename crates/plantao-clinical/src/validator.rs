// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-extraction validation and the first-complete-measurement rule.
//!
//! The LLM gateway already nulls out-of-range values, but nothing committed
//! downstream may rely on that: everything is enforced again here.

use plantao_core::llm::ClinicalExtraction;
use plantao_core::state::ClinicalBuffer;

use crate::pa::{normalize_pa, PaParse, PA_AMBIGUOUS_WARNING, PA_INVALID_WARNING};
use crate::ranges;

/// Default note for subsequent measurements committed without one.
pub const DEFAULT_NOTE: &str = "sem alterações";

/// What a clinical commit may do with the current buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitReadiness {
    /// Full measurement: five vitals + respiratory mode (+ note when first).
    ReadyFull,
    /// Standalone note, allowed only after the first complete measurement.
    ReadyNoteOnly,
    /// Fields still missing; labels in collection order.
    Missing(Vec<&'static str>),
    /// Note-only attempt before the first complete measurement.
    RejectedNoteOnlyFirst,
    /// Nothing clinical in the buffer at all.
    Empty,
}

/// Re-validate an extraction: null every out-of-range value with its warning
/// code and normalize the PA. Warnings already present are preserved.
pub fn sanitize(extraction: ClinicalExtraction) -> ClinicalExtraction {
    let mut out = ClinicalExtraction {
        warnings: extraction.warnings,
        respiratory_mode: extraction.respiratory_mode,
        clinical_note: extraction.clinical_note,
        ..ClinicalExtraction::default()
    };

    if let Some(raw) = extraction.pa.as_deref() {
        match normalize_pa(raw) {
            PaParse::Normalized(pa) => out.pa = Some(pa),
            PaParse::Ambiguous => push_warning(&mut out.warnings, PA_AMBIGUOUS_WARNING),
            PaParse::Invalid => push_warning(&mut out.warnings, PA_INVALID_WARNING),
        }
    }
    if let Some(hr) = extraction.hr {
        match ranges::check_int(hr, ranges::HR_RANGE, "FC_incoerente") {
            Ok(hr) => out.hr = Some(hr),
            Err(code) => push_warning(&mut out.warnings, code),
        }
    }
    if let Some(rr) = extraction.rr {
        match ranges::check_int(rr, ranges::RR_RANGE, "FR_incoerente") {
            Ok(rr) => out.rr = Some(rr),
            Err(code) => push_warning(&mut out.warnings, code),
        }
    }
    if let Some(sat) = extraction.sat_o2 {
        match ranges::check_int(sat, ranges::SAT_RANGE, "Sat_incoerente") {
            Ok(sat) => out.sat_o2 = Some(sat),
            Err(code) => push_warning(&mut out.warnings, code),
        }
    }
    if let Some(temp) = extraction.temp {
        match ranges::check_temp(temp) {
            Ok(temp) => out.temp = Some(temp),
            Err(code) => push_warning(&mut out.warnings, code),
        }
    }
    out
}

fn push_warning(warnings: &mut Vec<String>, code: &str) {
    if !warnings.iter().any(|w| w == code) {
        warnings.push(code.to_string());
    }
}

/// Decide whether the buffer can commit, and as what.
///
/// First measurement of the shift: the full vitals tuple AND the respiratory
/// mode AND a clinical note. Afterwards: the full tuple + mode (note
/// optional), or a standalone note with no vitals in flight.
pub fn commit_readiness(buffer: &ClinicalBuffer) -> CommitReadiness {
    let has_vitals = !buffer.vitals.is_empty();
    let has_note = buffer.clinical_note.is_some();
    let measuring = has_vitals || buffer.measurement_in_progress;

    if !has_vitals && !has_note && buffer.respiratory_mode.is_none() {
        return CommitReadiness::Empty;
    }

    if !buffer.first_complete_measurement_done {
        if has_note && !measuring {
            return CommitReadiness::RejectedNoteOnlyFirst;
        }
        let mut missing: Vec<&'static str> = buffer.vitals.missing();
        if buffer.respiratory_mode.is_none() {
            missing.push("condição respiratória");
        }
        if !has_note {
            missing.push("nota clínica");
        }
        return if missing.is_empty() {
            CommitReadiness::ReadyFull
        } else {
            CommitReadiness::Missing(missing)
        };
    }

    if !measuring && has_note {
        return CommitReadiness::ReadyNoteOnly;
    }

    let mut missing: Vec<&'static str> = buffer.vitals.missing();
    if buffer.respiratory_mode.is_none() {
        missing.push("condição respiratória");
    }
    if missing.is_empty() {
        CommitReadiness::ReadyFull
    } else {
        CommitReadiness::Missing(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_core::state::{RespiratoryMode, Vitals};

    fn full_vitals() -> Vitals {
        Vitals {
            pa: Some("120x80".into()),
            hr: Some(78),
            rr: Some(18),
            sat_o2: Some(97),
            temp: Some(36.8),
        }
    }

    #[test]
    fn sanitize_nulls_out_of_range_with_warning() {
        let extraction = ClinicalExtraction {
            hr: Some(300),
            sat_o2: Some(97),
            ..ClinicalExtraction::default()
        };
        let out = sanitize(extraction);
        assert!(out.hr.is_none());
        assert_eq!(out.sat_o2, Some(97));
        assert!(out.warnings.iter().any(|w| w == "FC_incoerente"));
    }

    #[test]
    fn sanitize_normalizes_pa_and_flags_ambiguity() {
        let out = sanitize(ClinicalExtraction {
            pa: Some("120/80".into()),
            ..ClinicalExtraction::default()
        });
        assert_eq!(out.pa.as_deref(), Some("120x80"));
        assert!(out.warnings.is_empty());

        let out = sanitize(ClinicalExtraction {
            pa: Some("12/8".into()),
            ..ClinicalExtraction::default()
        });
        assert!(out.pa.is_none());
        assert!(out.warnings.iter().any(|w| w == "PA_ambigua"));
    }

    #[test]
    fn first_measurement_requires_everything() {
        let mut buffer = ClinicalBuffer {
            vitals: full_vitals(),
            respiratory_mode: Some(RespiratoryMode::Ambient),
            clinical_note: None,
            ..ClinicalBuffer::default()
        };
        assert_eq!(
            commit_readiness(&buffer),
            CommitReadiness::Missing(vec!["nota clínica"])
        );
        buffer.clinical_note = Some("paciente estável".into());
        assert_eq!(commit_readiness(&buffer), CommitReadiness::ReadyFull);
    }

    #[test]
    fn first_measurement_rejects_note_only() {
        let buffer = ClinicalBuffer {
            clinical_note: Some("dormiu bem".into()),
            ..ClinicalBuffer::default()
        };
        assert_eq!(
            commit_readiness(&buffer),
            CommitReadiness::RejectedNoteOnlyFirst
        );
    }

    #[test]
    fn subsequent_measurement_note_is_optional() {
        let buffer = ClinicalBuffer {
            vitals: full_vitals(),
            respiratory_mode: Some(RespiratoryMode::SupplementalO2),
            clinical_note: None,
            first_complete_measurement_done: true,
            measurement_in_progress: true,
        };
        assert_eq!(commit_readiness(&buffer), CommitReadiness::ReadyFull);
    }

    #[test]
    fn subsequent_note_only_commits_directly() {
        let buffer = ClinicalBuffer {
            clinical_note: Some("visita médica tranquila".into()),
            first_complete_measurement_done: true,
            ..ClinicalBuffer::default()
        };
        assert_eq!(commit_readiness(&buffer), CommitReadiness::ReadyNoteOnly);
    }

    #[test]
    fn note_during_inflight_measurement_joins_it() {
        let buffer = ClinicalBuffer {
            vitals: Vitals {
                pa: Some("120x80".into()),
                ..Vitals::default()
            },
            clinical_note: Some("estável".into()),
            first_complete_measurement_done: true,
            measurement_in_progress: true,
            ..ClinicalBuffer::default()
        };
        match commit_readiness(&buffer) {
            CommitReadiness::Missing(missing) => {
                assert!(missing.contains(&"FC"));
                assert!(missing.contains(&"condição respiratória"));
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn empty_buffer_is_empty() {
        assert_eq!(
            commit_readiness(&ClinicalBuffer::default()),
            CommitReadiness::Empty
        );
    }
}

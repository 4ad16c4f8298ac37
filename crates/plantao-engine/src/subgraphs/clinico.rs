// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clinical subgraph: incremental vitals collection, the first-measurement
//! rule, and two-phase commit against `updateClinicalData` + the workflow
//! webhook.

use tracing::{info, warn};

use plantao_clinical::{commit_readiness, CommitReadiness, DEFAULT_NOTE};
use plantao_core::backend::ClinicalDataUpdate;
use plantao_core::llm::{ClinicalExtraction, ConfirmationVerdict};
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::{SessionState, Vitals};
use plantao_core::types::{ActionFlow, ActionStatus};
use plantao_core::PlantaoError;

use crate::tpc;

use super::{SubgraphOutcome, TurnContext};

pub async fn run(
    state: &mut SessionState,
    text: &str,
    confirmation: Option<ConfirmationVerdict>,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let has_staged_commit = state
        .staged_action(ctx.now_epoch)
        .is_some_and(|a| a.flow == ActionFlow::ClinicalCommit);

    if let (Some(verdict), true) = (confirmation, has_staged_commit) {
        return answer_staged(state, verdict, ctx).await;
    }

    // Collection step: extract, merge, evaluate readiness.
    let extraction = match ctx.llm.extract_clinical(text).await {
        Ok(extraction) => extraction,
        Err(err) => {
            warn!(error = %err, "clinical extraction unavailable");
            return Ok(SubgraphOutcome::with_hint(
                OutcomeCode::HelpContext,
                "Não consegui processar os dados agora. Reenvie em instantes.",
            ));
        }
    };

    let warning_hint = warnings_hint(&extraction);
    merge_extraction(state, &extraction);

    match commit_readiness(&state.clinical) {
        CommitReadiness::Empty => Ok(SubgraphOutcome::with_hint(
            OutcomeCode::HelpContext,
            join_hints(
                "Não identifiquei dados clínicos na mensagem. Envie os sinais vitais (PA, FC, FR, Sat, Temp) ou uma nota sobre o paciente.",
                &warning_hint,
            ),
        )),
        CommitReadiness::RejectedNoteOnlyFirst => Ok(SubgraphOutcome::with_hint(
            OutcomeCode::ClinicalRejectedIncompleteFirst,
            warning_hint,
        )),
        CommitReadiness::Missing(missing) => Ok(SubgraphOutcome::with_hint(
            OutcomeCode::ClinicalMissing,
            join_hints(&format!("Faltam: {}.", missing.join(", ")), &warning_hint),
        )),
        CommitReadiness::ReadyNoteOnly => commit_note_only(state, ctx).await,
        CommitReadiness::ReadyFull => {
            let payload = build_payload(state, None, false);
            let description = stage_description(state);
            let action = tpc::stage_action(
                ActionFlow::ClinicalCommit,
                serde_json::to_value(&payload).map_err(PlantaoError::storage)?,
                description,
                ctx.now_epoch,
                ctx.config.action_expiry_minutes,
            );
            if let Err(err) = ctx.store.put_pending_action(&state.session_id, &action).await {
                warn!(error = %err, "failed to audit staged clinical action");
            }
            let prompt = tpc::confirmation_prompt(&action);
            state.pending_action = Some(action);
            Ok(SubgraphOutcome::with_hint(
                OutcomeCode::ClinicalStaged,
                join_hints(&prompt, &warning_hint),
            ))
        }
    }
}

/// Merge rule: non-null extracted values fill or refresh; nulls never erase;
/// the PA arrives already normalized or absent (ambiguity handled upstream).
/// Also used by the engine to park vitals sent before presence confirmation.
pub(crate) fn merge_extraction(state: &mut SessionState, extraction: &ClinicalExtraction) {
    let incoming = Vitals {
        pa: extraction.pa.clone(),
        hr: extraction.hr,
        rr: extraction.rr,
        sat_o2: extraction.sat_o2,
        temp: extraction.temp,
    };
    state.clinical.vitals.merge(&incoming);
    if extraction.respiratory_mode.is_some() {
        state.clinical.respiratory_mode = extraction.respiratory_mode;
    }
    if let Some(note) = &extraction.clinical_note {
        state.clinical.clinical_note = Some(note.clone());
    }
    if extraction.has_any_vital() {
        state.clinical.measurement_in_progress = true;
    }
}

fn warnings_hint(extraction: &ClinicalExtraction) -> String {
    let mut hints = Vec::new();
    for warning in &extraction.warnings {
        if warning == "PA_ambigua" {
            hints.push("A PA ficou ambígua. Se for 120 por 80, envie 'PA 120x80'.".to_string());
        } else if let Some(field) = warning.strip_suffix("_incoerente") {
            hints.push(format!("{field} fora da faixa plausível, foi ignorado."));
        }
    }
    hints.join("\n")
}

fn join_hints(first: &str, second: &str) -> String {
    if second.trim().is_empty() {
        first.to_string()
    } else {
        format!("{first}\n{second}")
    }
}

fn stage_description(state: &SessionState) -> String {
    let mut parts = vec!["Confirma salvar:".to_string()];
    let summary = state.clinical.vitals.summary();
    if !summary.is_empty() {
        parts.push(format!("Vitais: {summary}"));
    }
    if let Some(mode) = state.clinical.respiratory_mode {
        parts.push(format!("Respiração: {}", mode.payload_label()));
    }
    if let Some(note) = &state.clinical.clinical_note {
        let preview: String = note.chars().take(50).collect();
        parts.push(format!("Nota: {preview}"));
    }
    parts.join("\n")
}

/// Canonical clinical record for the backend and the webhook.
fn build_payload(
    state: &SessionState,
    action_id: Option<String>,
    note_only: bool,
) -> ClinicalDataUpdate {
    let clinical = &state.clinical;
    let mut update = ClinicalDataUpdate {
        report_id: state.shift.report_id.clone().unwrap_or_default(),
        report_date: state.shift.report_date.clone().unwrap_or_default(),
        caregiver_identifier: state.caregiver_id.clone(),
        patient_identifier: state.shift.patient_id.clone(),
        action_id,
        ..ClinicalDataUpdate::default()
    };
    if note_only {
        update.clinical_note = clinical.clinical_note.clone();
        return update;
    }
    update.blood_pressure = clinical.vitals.pa.clone();
    update.heart_rate = clinical.vitals.hr;
    update.resp_rate = clinical.vitals.rr;
    update.saturation_o2 = clinical.vitals.sat_o2;
    update.temperature = clinical.vitals.temp;
    update.supplementary_oxygen = clinical
        .respiratory_mode
        .map(|m| m.payload_label().to_string());
    update.clinical_note = Some(
        clinical
            .clinical_note
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTE.to_string()),
    );
    update
}

/// The webhook receives the same envelope plus the session id.
fn webhook_payload(state: &SessionState, update: &ClinicalDataUpdate) -> serde_json::Value {
    let mut payload = serde_json::to_value(update).unwrap_or_default();
    if let Some(object) = payload.as_object_mut() {
        object.insert(
            "sessionID".into(),
            serde_json::Value::String(state.phone_number.clone()),
        );
        if let Some(schedule_id) = &state.shift.schedule_id {
            object.insert(
                "scheduleID".into(),
                serde_json::Value::String(schedule_id.clone()),
            );
        }
    }
    payload
}

async fn commit_note_only(
    state: &mut SessionState,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let update = build_payload(state, None, true);
    match ctx.backend.update_clinical_data(&update).await {
        Ok(()) => {
            deliver_webhook(state, &update, ctx).await;
            state.clinical.clear_measurement();
            info!("standalone clinical note committed");
            Ok(SubgraphOutcome::new(OutcomeCode::ClinicalNoteOnlyCommitted))
        }
        Err(err) => {
            warn!(error = %err, "note-only commit failed, note kept for retry");
            Ok(SubgraphOutcome::new(OutcomeCode::ClinicalCommitFailed))
        }
    }
}

async fn answer_staged(
    state: &mut SessionState,
    verdict: ConfirmationVerdict,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let action = state
        .pending_action
        .clone()
        .ok_or_else(|| PlantaoError::InvariantViolation("staged clinical action vanished".into()))?;

    match verdict {
        ConfirmationVerdict::Yes => {
            let mut update: ClinicalDataUpdate =
                serde_json::from_value(action.payload.clone()).map_err(PlantaoError::storage)?;
            update.action_id = Some(action.action_id.clone());

            audit(ctx, state, &action.action_id, ActionStatus::Staged, ActionStatus::Confirmed).await;

            match ctx.backend.update_clinical_data(&update).await {
                Ok(()) => {
                    audit(ctx, state, &action.action_id, ActionStatus::Confirmed, ActionStatus::Executed).await;
                    deliver_webhook(state, &update, ctx).await;
                    state.clinical.first_complete_measurement_done = true;
                    state.clinical.clear_measurement();
                    state.pending_action = None;
                    info!("clinical measurement committed");
                    Ok(SubgraphOutcome::new(OutcomeCode::ClinicalCommitted))
                }
                Err(err @ (PlantaoError::BackendTransient(_) | PlantaoError::Timeout { .. })) => {
                    warn!(error = %err, "clinical commit failed transiently, keeping staged action");
                    Ok(SubgraphOutcome::new(OutcomeCode::ClinicalCommitFailed))
                }
                Err(err) => {
                    warn!(error = %err, "clinical commit failed permanently");
                    audit(ctx, state, &action.action_id, ActionStatus::Confirmed, ActionStatus::Cancelled).await;
                    state.pending_action = None;
                    Ok(SubgraphOutcome::with_hint(
                        OutcomeCode::ClinicalCommitFailed,
                        "Tente novamente mais tarde.",
                    ))
                }
            }
        }
        ConfirmationVerdict::No | ConfirmationVerdict::Cancel => {
            // Buffer survives; only the staged action goes away.
            audit(ctx, state, &action.action_id, ActionStatus::Staged, ActionStatus::Cancelled).await;
            state.pending_action = None;
            Ok(SubgraphOutcome::new(OutcomeCode::ClinicalCancelled))
        }
        ConfirmationVerdict::Unclear => Ok(SubgraphOutcome::with_hint(
            OutcomeCode::ConfirmationPending,
            action.description.clone(),
        )),
    }
}

/// Webhook delivery is idempotent downstream; a failure never undoes the
/// backend commit.
async fn deliver_webhook(state: &SessionState, update: &ClinicalDataUpdate, ctx: &TurnContext<'_>) {
    let payload = webhook_payload(state, update);
    if let Err(err) = ctx.backend.post_workflow_event(&payload).await {
        warn!(error = %err, "clinical webhook delivery failed");
    }
}

async fn audit(
    ctx: &TurnContext<'_>,
    state: &SessionState,
    action_id: &str,
    from: ActionStatus,
    to: ActionStatus,
) {
    if let Err(err) = ctx
        .store
        .transition_pending_action(&state.session_id, action_id, from, to)
        .await
    {
        warn!(error = %err, action_id, "pending-action audit transition failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_core::state::RespiratoryMode;

    #[test]
    fn merge_never_erases_with_nulls() {
        let mut state = SessionState::new("s1");
        state.clinical.vitals.pa = Some("120x80".into());
        state.clinical.respiratory_mode = Some(RespiratoryMode::Ambient);

        merge_extraction(&mut state, &ClinicalExtraction {
            hr: Some(78),
            ..ClinicalExtraction::default()
        });
        assert_eq!(state.clinical.vitals.pa.as_deref(), Some("120x80"));
        assert_eq!(state.clinical.vitals.hr, Some(78));
        assert_eq!(state.clinical.respiratory_mode, Some(RespiratoryMode::Ambient));
        assert!(state.clinical.measurement_in_progress);
    }

    #[test]
    fn payload_defaults_note_for_subsequent_measurements() {
        let mut state = SessionState::new("s1");
        state.shift.report_id = Some("rep-1".into());
        state.shift.report_date = Some("2026-08-02".into());
        state.clinical.vitals = Vitals {
            pa: Some("120x80".into()),
            hr: Some(78),
            rr: Some(18),
            sat_o2: Some(97),
            temp: Some(36.8),
        };
        state.clinical.respiratory_mode = Some(RespiratoryMode::Ambient);

        let payload = build_payload(&state, None, false);
        assert_eq!(payload.clinical_note.as_deref(), Some(DEFAULT_NOTE));
        assert_eq!(payload.supplementary_oxygen.as_deref(), Some("Ar ambiente"));
        assert_eq!(payload.blood_pressure.as_deref(), Some("120x80"));
    }

    #[test]
    fn webhook_payload_carries_session_id() {
        let mut state = SessionState::new("5511999999999");
        state.shift.schedule_id = Some("sch-1".into());
        state.clinical.clinical_note = Some("estável".into());
        let update = build_payload(&state, None, true);
        let payload = webhook_payload(&state, &update);
        assert_eq!(payload["sessionID"], "5511999999999");
        assert_eq!(payload["scheduleID"], "sch-1");
        assert_eq!(payload["clinicalNote"], "estável");
    }

    #[test]
    fn warning_hints_are_readable() {
        let extraction = ClinicalExtraction {
            warnings: vec!["PA_ambigua".into(), "FC_incoerente".into()],
            ..ClinicalExtraction::default()
        };
        let hint = warnings_hint(&extraction);
        assert!(hint.contains("PA 120x80"));
        assert!(hint.contains("FC fora da faixa"));
    }
}

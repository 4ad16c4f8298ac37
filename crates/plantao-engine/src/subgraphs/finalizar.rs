// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finalization subgraph: collect the eight report topics, then two-phase
//! commit the shift summary against `updatereportsummaryad`.

use tracing::{info, warn};

use plantao_core::backend::ReportSummaryUpdate;
use plantao_core::llm::ConfirmationVerdict;
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::{SessionState, TOPIC_LABELS};
use plantao_core::types::{ActionFlow, ActionStatus};
use plantao_core::PlantaoError;

use crate::bootstrap::rehydrate;
use crate::tpc;

use super::{SubgraphOutcome, TurnContext};

/// Value recorded for topics the caregiver had nothing to report on.
const NO_INFORMATION: &str = "Sem informações";

pub async fn run(
    state: &mut SessionState,
    text: &str,
    confirmation: Option<ConfirmationVerdict>,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let has_staged_commit = state
        .staged_action(ctx.now_epoch)
        .is_some_and(|a| a.flow == ActionFlow::FinalizeCommit);

    if let (Some(verdict), true) = (confirmation, has_staged_commit) {
        return answer_staged(state, verdict, ctx).await;
    }

    if !state.shift.finish_reminder_sent {
        // Router never sends us here before the reminder; answer helpfully
        // without mentioning the closing step.
        return Ok(SubgraphOutcome::with_hint(
            OutcomeCode::HelpContext,
            "Essa etapa ainda não está liberada para o seu plantão. Continue registrando os dados do paciente.",
        ));
    }

    // First entry: seed context with the notes already recorded on the report.
    if !state.finalization.notes_seeded {
        seed_existing_notes(state, ctx).await;
    }

    // Extract whatever topics this message fills.
    let extraction = match ctx
        .llm
        .extract_finalization_topics(
            text,
            &state.finalization.topics,
            &state.finalization.existing_notes,
        )
        .await
    {
        Ok(extraction) => extraction,
        Err(err) => {
            warn!(error = %err, "finalization extraction unavailable");
            return Ok(SubgraphOutcome::with_hint(
                OutcomeCode::FinalizeTopicCollected,
                next_topic_hint(state),
            ));
        }
    };

    for (key, value) in extraction.filled() {
        // Only unfilled topics accept values; confirmed answers never change.
        if state.finalization.topics.get(key).is_none() {
            state.finalization.topics.set(key, value.clone());
            forward_topic(state, key, value, ctx).await;
        }
    }

    if !state.finalization.topics.is_complete() {
        return Ok(SubgraphOutcome::with_hint(
            OutcomeCode::FinalizeTopicCollected,
            next_topic_hint(state),
        ));
    }

    // All eight topics filled: stage the final summary.
    let payload = build_summary(state, None);
    let action = tpc::stage_action(
        ActionFlow::FinalizeCommit,
        serde_json::to_value(&payload).map_err(PlantaoError::storage)?,
        summary_description(state),
        ctx.now_epoch,
        ctx.config.action_expiry_minutes,
    );
    if let Err(err) = ctx.store.put_pending_action(&state.session_id, &action).await {
        warn!(error = %err, "failed to audit staged finalization");
    }
    let prompt = tpc::confirmation_prompt(&action);
    state.pending_action = Some(action);
    Ok(SubgraphOutcome::with_hint(OutcomeCode::FinalizeStaged, prompt))
}

async fn seed_existing_notes(state: &mut SessionState, ctx: &TurnContext<'_>) {
    let (Some(report_id), Some(report_date)) = (
        state.shift.report_id.clone(),
        state.shift.report_date.clone(),
    ) else {
        state.finalization.notes_seeded = true;
        return;
    };
    match ctx.backend.get_note_report(&report_id, &report_date).await {
        Ok(notes) => {
            state.finalization.existing_notes = notes
                .into_iter()
                .map(|n| n.note_desc_ai)
                .filter(|n| !n.is_empty())
                .collect();
            info!(
                total = state.finalization.existing_notes.len(),
                "existing shift notes seeded"
            );
        }
        Err(err) => {
            warn!(error = %err, "could not fetch existing notes, continuing without them");
        }
    }
    state.finalization.notes_seeded = true;
}

/// Each newly filled topic is forwarded to the workflow webhook as a tagged
/// note; failures are logged and retried implicitly by the final summary.
async fn forward_topic(state: &SessionState, key: &str, value: &str, ctx: &TurnContext<'_>) {
    let label = TOPIC_LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key);
    let payload = serde_json::json!({
        "clinicalNote": format!("[{label}] {value}"),
        "noteType": "finalization",
        "topic": key,
        "sessionID": state.phone_number,
        "reportID": state.shift.report_id,
        "reportDate": state.shift.report_date,
        "scheduleID": state.shift.schedule_id,
        "caregiverIdentifier": state.caregiver_id,
        "patientIdentifier": state.shift.patient_id,
    });
    if let Err(err) = ctx.backend.post_workflow_event(&payload).await {
        warn!(error = %err, topic = key, "topic forwarding failed");
    }
}

fn next_topic_hint(state: &SessionState) -> String {
    let missing = state.finalization.topics.missing();
    match missing.first() {
        Some(&first) => {
            let label = TOPIC_LABELS
                .iter()
                .find(|(k, _)| *k == first)
                .map(|(_, label)| *label)
                .unwrap_or(first);
            format!(
                "Como foi {label}? (faltam {} de 8 tópicos; responda 'sem informações' se não houver nada a relatar)",
                missing.len()
            )
        }
        None => String::new(),
    }
}

fn summary_description(state: &SessionState) -> String {
    let mut lines = vec!["Resumo da finalização:".to_string()];
    for (key, label) in TOPIC_LABELS {
        let value = state
            .finalization
            .topics
            .get(key)
            .cloned()
            .unwrap_or_else(|| NO_INFORMATION.to_string());
        lines.push(format!("• {label}: {value}"));
    }
    lines.push("Enviar o relatório final do plantão?".to_string());
    lines.join("\n")
}

fn build_summary(state: &SessionState, action_id: Option<String>) -> ReportSummaryUpdate {
    let topics = &state.finalization.topics;
    let first_name = |name: &Option<String>| -> String {
        name.as_deref()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or_default()
            .to_string()
    };
    let topic_or_default = |key: &str| -> String {
        topics
            .get(key)
            .cloned()
            .unwrap_or_else(|| NO_INFORMATION.to_string())
    };
    ReportSummaryUpdate {
        report_id: state.shift.report_id.clone().unwrap_or_default(),
        report_date: state.shift.report_date.clone().unwrap_or_default(),
        schedule_id: state.shift.schedule_id.clone().unwrap_or_default(),
        patient_first_name: first_name(&state.shift.patient_name),
        shift_day: state.shift.shift_day.clone().unwrap_or_default(),
        shift_start: state.shift.shift_start.clone().unwrap_or_default(),
        shift_end: state.shift.shift_end.clone().unwrap_or_default(),
        caregiver_first_name: first_name(&state.caregiver_name),
        caregiver_id: state.caregiver_id.clone().unwrap_or_default(),
        food_hydration_specification: topic_or_default("alimentacao"),
        stool_urine_specification: topic_or_default("evacuacoes"),
        sleep_specification: topic_or_default("sono"),
        mood_specification: topic_or_default("humor"),
        medications_specification: topic_or_default("medicacoes"),
        activities_specification: topic_or_default("atividades"),
        additional_information_specification: topic_or_default("adicional_clinico"),
        administrative_info: topic_or_default("adicional_administrativo"),
        action_id,
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
        .ok_or_else(|| PlantaoError::InvariantViolation("staged finalization vanished".into()))?;

    match verdict {
        ConfirmationVerdict::Yes => {
            let mut request: ReportSummaryUpdate =
                serde_json::from_value(action.payload.clone()).map_err(PlantaoError::storage)?;
            request.action_id = Some(action.action_id.clone());

            audit(ctx, state, &action.action_id, ActionStatus::Staged, ActionStatus::Confirmed).await;

            match ctx.backend.update_report_summary(&request).await {
                Ok(()) => {
                    audit(ctx, state, &action.action_id, ActionStatus::Confirmed, ActionStatus::Executed).await;
                    state.reset_after_finalization();
                    rehydrate(state, ctx.backend).await;
                    info!("shift finalized");
                    Ok(SubgraphOutcome::new(OutcomeCode::FinalizeCommitted))
                }
                Err(err @ (PlantaoError::BackendTransient(_) | PlantaoError::Timeout { .. })) => {
                    warn!(error = %err, "finalization commit failed transiently, keeping staged action");
                    Ok(SubgraphOutcome::new(OutcomeCode::FinalizeCommitFailed))
                }
                Err(err) => {
                    warn!(error = %err, "finalization commit failed permanently");
                    audit(ctx, state, &action.action_id, ActionStatus::Confirmed, ActionStatus::Cancelled).await;
                    state.pending_action = None;
                    Ok(SubgraphOutcome::with_hint(
                        OutcomeCode::FinalizeCommitFailed,
                        "Tente novamente mais tarde.",
                    ))
                }
            }
        }
        ConfirmationVerdict::No | ConfirmationVerdict::Cancel => {
            audit(ctx, state, &action.action_id, ActionStatus::Staged, ActionStatus::Cancelled).await;
            state.pending_action = None;
            Ok(SubgraphOutcome::new(OutcomeCode::FinalizeCancelled))
        }
        ConfirmationVerdict::Unclear => Ok(SubgraphOutcome::with_hint(
            OutcomeCode::ConfirmationPending,
            action.description.clone(),
        )),
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
    use plantao_test_utils::confirmed_state;

    #[test]
    fn summary_fills_unanswered_topics_with_default() {
        let mut state = confirmed_state("s1");
        state.finalization.topics.set("sono", "dormiu bem".into());
        let summary = build_summary(&state, None);
        assert_eq!(summary.sleep_specification, "dormiu bem");
        assert_eq!(summary.mood_specification, NO_INFORMATION);
        assert_eq!(summary.report_id, "rep-1");
        assert_eq!(summary.patient_first_name, "Sr.");
    }

    #[test]
    fn next_topic_hint_walks_collection_order() {
        let mut state = confirmed_state("s1");
        let hint = next_topic_hint(&state);
        assert!(hint.contains("Alimentação"));
        assert!(hint.contains("8 de 8"));

        state.finalization.topics.set("alimentacao", "comeu bem".into());
        let hint = next_topic_hint(&state);
        assert!(hint.contains("Evacuações"));
        assert!(hint.contains("7 de 8"));
    }

    #[test]
    fn summary_description_lists_all_topics() {
        let state = confirmed_state("s1");
        let description = summary_description(&state);
        for (_, label) in TOPIC_LABELS {
            assert!(description.contains(label), "missing {label}");
        }
    }
}

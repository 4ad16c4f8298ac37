// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attendance subgraph: confirm or cancel presence on the shift, with
//! two-phase commit against `updateWorkScheduleResponse`.

use tracing::{info, warn};

use plantao_core::backend::ScheduleResponseUpdate;
use plantao_core::llm::ConfirmationVerdict;
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::{SessionState, ShiftResponse};
use plantao_core::types::{ActionFlow, ActionStatus};
use plantao_core::PlantaoError;

use crate::bootstrap::rehydrate;
use crate::tpc;

use super::{SubgraphOutcome, TurnContext};

/// What the caregiver wants to do with the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttendanceIntent {
    Confirm,
    Cancel,
}

/// Keyword screening; cancellation wording has priority.
fn detect_attendance_intent(text: &str) -> AttendanceIntent {
    const CANCEL_KEYWORDS: [&str; 11] = [
        "cancelar",
        "cancelo",
        "não posso",
        "nao posso",
        "não vou",
        "nao vou",
        "emergência",
        "emergencia",
        "doente",
        "problema",
        "imprevisto",
    ];
    let lower = text.to_lowercase();
    if CANCEL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        AttendanceIntent::Cancel
    } else {
        AttendanceIntent::Confirm
    }
}

pub async fn run(
    state: &mut SessionState,
    text: &str,
    confirmation: Option<ConfirmationVerdict>,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let has_staged_commit = state
        .staged_action(ctx.now_epoch)
        .is_some_and(|a| a.flow == ActionFlow::EscalaCommit);

    if let (Some(verdict), true) = (confirmation, has_staged_commit) {
        return answer_staged(state, verdict, ctx).await;
    }

    let Some(schedule_id) = state.shift.schedule_id.clone() else {
        return Ok(SubgraphOutcome::new(OutcomeCode::NoShiftFound));
    };

    // Fresh entry: screen the wording and stage the matching commit.
    let intent = detect_attendance_intent(text);
    let response_value = match intent {
        AttendanceIntent::Confirm => "confirmado",
        AttendanceIntent::Cancel => "cancelado",
    };
    let shift_day = state.shift.shift_day.as_deref().unwrap_or("hoje");
    let shift_start = state.shift.shift_start.as_deref().unwrap_or("o horário combinado");
    let patient = state.shift.patient_name.as_deref().unwrap_or("o paciente");
    let description = match intent {
        AttendanceIntent::Confirm => format!(
            "Confirmar presença no plantão de {shift_day} às {shift_start} para {patient}?"
        ),
        AttendanceIntent::Cancel => format!(
            "Cancelar o plantão de {shift_day} às {shift_start} para {patient}?"
        ),
    };

    let action = tpc::stage_action(
        ActionFlow::EscalaCommit,
        serde_json::json!({
            "scheduleIdentifier": schedule_id,
            "responseValue": response_value,
        }),
        description,
        ctx.now_epoch,
        ctx.config.action_expiry_minutes,
    );
    if let Err(err) = ctx.store.put_pending_action(&state.session_id, &action).await {
        warn!(error = %err, "failed to audit staged attendance action");
    }
    let prompt = tpc::confirmation_prompt(&action);
    state.pending_action = Some(action);

    info!(intent = ?intent, "attendance action staged");
    Ok(SubgraphOutcome::with_hint(OutcomeCode::EscalaStaged, prompt))
}

async fn answer_staged(
    state: &mut SessionState,
    verdict: ConfirmationVerdict,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let action = state
        .pending_action
        .clone()
        .ok_or_else(|| PlantaoError::InvariantViolation("staged escala action vanished".into()))?;

    match verdict {
        ConfirmationVerdict::Yes => {
            let schedule_identifier = action.payload["scheduleIdentifier"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let response_value = action.payload["responseValue"]
                .as_str()
                .unwrap_or("confirmado")
                .to_string();
            let request = ScheduleResponseUpdate {
                schedule_identifier,
                response_value: response_value.clone(),
                action_id: Some(action.action_id.clone()),
            };

            audit_transition(ctx, state, &action.action_id, ActionStatus::Staged, ActionStatus::Confirmed).await;

            match ctx.backend.update_work_schedule_response(&request).await {
                Ok(()) => {
                    audit_transition(ctx, state, &action.action_id, ActionStatus::Confirmed, ActionStatus::Executed).await;
                    state.shift.response = if response_value == "cancelado" {
                        ShiftResponse::Cancelado
                    } else {
                        ShiftResponse::Confirmado
                    };
                    state.pending_action = None;
                    rehydrate(state, ctx.backend).await;

                    let mut outcome = SubgraphOutcome::with_hint(
                        OutcomeCode::EscalaConfirmed,
                        if response_value == "cancelado" {
                            "Plantão cancelado conforme solicitado."
                        } else {
                            "Presença confirmada."
                        },
                    );
                    // A diverted flow (vitals sent before confirming) resumes now.
                    if response_value != "cancelado" {
                        if let Some(resume) = state.resume_after.take() {
                            outcome.reroute = Some(resume.flow);
                        }
                    } else {
                        state.resume_after = None;
                    }
                    Ok(outcome)
                }
                Err(err @ (PlantaoError::BackendTransient(_) | PlantaoError::Timeout { .. })) => {
                    warn!(error = %err, "attendance commit failed transiently, keeping staged action");
                    Ok(SubgraphOutcome::new(OutcomeCode::EscalaCommitFailed))
                }
                Err(err) => {
                    warn!(error = %err, "attendance commit failed permanently");
                    audit_transition(ctx, state, &action.action_id, ActionStatus::Confirmed, ActionStatus::Cancelled).await;
                    state.pending_action = None;
                    Ok(SubgraphOutcome::with_hint(
                        OutcomeCode::EscalaCommitFailed,
                        "Tente novamente mais tarde.",
                    ))
                }
            }
        }
        ConfirmationVerdict::No | ConfirmationVerdict::Cancel => {
            audit_transition(ctx, state, &action.action_id, ActionStatus::Staged, ActionStatus::Cancelled).await;
            state.pending_action = None;
            Ok(SubgraphOutcome::new(OutcomeCode::EscalaCancelled))
        }
        ConfirmationVerdict::Unclear => Ok(SubgraphOutcome::with_hint(
            OutcomeCode::ConfirmationPending,
            action.description.clone(),
        )),
    }
}

/// Audit-table transition; the embedded copy in the state is authoritative,
/// so a failed audit write is logged, not fatal.
async fn audit_transition(
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

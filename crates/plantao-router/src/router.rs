// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gate ladder: deterministic, ordered route selection per message.
//!
//! Gates in exact order — finish-gate, pending-confirmation, operational-note,
//! attendance-gate, LLM intent. The first gate that fires selects the
//! subgraph and short-circuits. The LLM is consulted only where a
//! deterministic rule cannot decide.

use tracing::{debug, warn};

use plantao_core::llm::{ConfirmationVerdict, OperationalNote};
use plantao_core::state::{CompactState, SessionState};
use plantao_core::types::{ActionFlow, Flow};
use plantao_core::{LlmGateway, PlantaoError};

use crate::confirm::quick_confirmation;

/// Which gate selected the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    FinishGate,
    PendingConfirmation,
    OperationalDivert,
    OperationalNote,
    AttendanceGate,
    LlmIntent,
}

/// The router's verdict for one message.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub flow: Flow,
    pub gate: Gate,
    /// Set when the message answered a staged confirmation.
    pub confirmation: Option<ConfirmationVerdict>,
    /// Set when an operational gate fired.
    pub operational: Option<OperationalNote>,
}

impl RouteDecision {
    fn new(flow: Flow, gate: Gate) -> Self {
        Self {
            flow,
            gate,
            confirmation: None,
            operational: None,
        }
    }
}

/// Evaluate the ladder for one message.
///
/// LLM failures degrade instead of aborting the turn: an unreachable
/// operational detector means "not operational", an unreachable intent
/// classifier means `auxiliar`.
pub async fn route(
    state: &SessionState,
    text: &str,
    now_epoch: i64,
    llm: &dyn LlmGateway,
) -> Result<RouteDecision, PlantaoError> {
    let staged = state.staged_action(now_epoch);

    // Gate 1: finish-gate. Once the backend flags the shift ready to close,
    // everything routes to finalizar — except a staged action for another
    // flow, which wins only when the text actually answers it. A staged
    // finalize commit falls through to the pending-confirmation gate.
    if state.shift.finish_reminder_sent {
        match staged {
            Some(action) if action.flow != ActionFlow::FinalizeCommit => {
                let verdict = confirmation_verdict(text, llm).await;
                if verdict != ConfirmationVerdict::Unclear {
                    debug!(flow = %action.flow, "finish-gate yields to staged confirmation");
                    let mut decision = RouteDecision::new(
                        action.flow.target_flow(),
                        Gate::PendingConfirmation,
                    );
                    decision.confirmation = Some(verdict);
                    return Ok(decision);
                }
                return Ok(RouteDecision::new(Flow::Finalizar, Gate::FinishGate));
            }
            Some(_) => {}
            None => return Ok(RouteDecision::new(Flow::Finalizar, Gate::FinishGate)),
        }
    }

    // Gate 2: pending-confirmation. Urgent operational content diverts
    // without cancelling the staged action.
    if let Some(action) = staged {
        let operational = detect_operational(text, llm).await;
        if let Some(op) = operational.filter(|op| op.is_operational) {
            debug!("pending confirmation interrupted by operational note");
            let mut decision = RouteDecision::new(Flow::Operacional, Gate::OperationalDivert);
            decision.operational = Some(op);
            return Ok(decision);
        }
        let verdict = confirmation_verdict(text, llm).await;
        let mut decision =
            RouteDecision::new(action.flow.target_flow(), Gate::PendingConfirmation);
        decision.confirmation = Some(verdict);
        return Ok(decision);
    }

    // Gate 3: operational-note.
    if let Some(op) = detect_operational(text, llm).await.filter(|op| op.is_operational) {
        let mut decision = RouteDecision::new(Flow::Operacional, Gate::OperationalNote);
        decision.operational = Some(op);
        return Ok(decision);
    }

    // Gate 4: attendance-gate.
    if state.shift.attendance_pending() {
        return Ok(RouteDecision::new(Flow::Escala, Gate::AttendanceGate));
    }

    // Gate 5: LLM intent.
    let compact = CompactState::project(state);
    let flow = match llm.classify_intent(text, &compact).await {
        Ok(classification) => {
            debug!(intent = %classification.intent, confidence = classification.confidence, "intent gate");
            classification.intent.to_flow()
        }
        Err(err) => {
            warn!(error = %err, "intent classification failed, falling back to auxiliar");
            Flow::Auxiliar
        }
    };
    Ok(RouteDecision::new(flow, Gate::LlmIntent))
}

/// Fast-path first; the LLM only for unclear answers. An unreachable LLM
/// leaves the verdict unclear, which re-asks instead of guessing.
async fn confirmation_verdict(text: &str, llm: &dyn LlmGateway) -> ConfirmationVerdict {
    let quick = quick_confirmation(text);
    if quick != ConfirmationVerdict::Unclear {
        return quick;
    }
    match llm.classify_confirmation(text).await {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(error = %err, "confirmation classification failed");
            ConfirmationVerdict::Unclear
        }
    }
}

async fn detect_operational(text: &str, llm: &dyn LlmGateway) -> Option<OperationalNote> {
    match llm.detect_operational_note(text).await {
        Ok(note) => Some(note),
        Err(err) => {
            warn!(error = %err, "operational detection failed, treating as non-operational");
            None
        }
    }
}

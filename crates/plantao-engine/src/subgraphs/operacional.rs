// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operational subgraph: single-shot delivery of supplies/infrastructure
//! observations to the workflow webhook. No staging, no buffer interaction.

use tracing::{info, warn};

use plantao_core::llm::{OperationalNote, Urgency};
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::SessionState;
use plantao_core::PlantaoError;

use super::{SubgraphOutcome, TurnContext};

pub async fn run(
    state: &mut SessionState,
    text: &str,
    note: Option<&OperationalNote>,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    // Webhook delivery is exempt from OCC replay: once delivered in this
    // message's lifetime, later attempts only re-record the outcome.
    if ctx.operational_already_delivered {
        let mut outcome = SubgraphOutcome::new(OutcomeCode::OperationalDelivered);
        outcome.operational_delivered = true;
        return Ok(outcome);
    }

    let (note_text, urgency) = match note {
        Some(op) => (
            op.note.clone().unwrap_or_else(|| text.to_string()),
            op.urgency,
        ),
        None => (text.to_string(), Urgency::Normal),
    };

    let payload = serde_json::json!({
        "clinicalNote": note_text,
        "noteType": "operational",
        "urgency": urgency,
        "sessionID": state.phone_number,
        "reportID": state.shift.report_id,
        "reportDate": state.shift.report_date,
        "scheduleID": state.shift.schedule_id,
        "caregiverIdentifier": state.caregiver_id,
        "patientIdentifier": state.shift.patient_id,
    });

    match ctx.backend.post_workflow_event(&payload).await {
        Ok(()) => {
            info!(urgency = %urgency, "operational note delivered");
            let mut outcome = SubgraphOutcome::new(OutcomeCode::OperationalDelivered);
            outcome.operational_delivered = true;
            Ok(outcome)
        }
        Err(err) => {
            // Never blocks other flows; the caregiver is asked to resend.
            warn!(error = %err, "operational note delivery failed");
            Ok(SubgraphOutcome::new(OutcomeCode::OperationalDeliveryFailed))
        }
    }
}

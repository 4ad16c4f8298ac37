// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The five subgraphs: small state machines over the loaded session state.
//!
//! A subgraph either finalizes the turn with an outcome code for the fiscal
//! consolidator, or requests a single continuation hop back through the
//! dispatcher. The engine enforces the one-hop bound.

pub mod auxiliar;
pub mod clinico;
pub mod escala;
pub mod finalizar;
pub mod operacional;

use plantao_config::model::EngineConfig;
use plantao_core::llm::{ConfirmationVerdict, OperationalNote};
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::SessionState;
use plantao_core::types::Flow;
use plantao_core::{LlmGateway, PlantaoError, SessionStore, ShiftBackend};
use plantao_router::RouteDecision;

/// Everything a subgraph may touch besides the state itself.
pub struct TurnContext<'a> {
    pub llm: &'a dyn LlmGateway,
    pub backend: &'a dyn ShiftBackend,
    pub store: &'a dyn SessionStore,
    pub config: &'a EngineConfig,
    pub now_epoch: i64,
    /// Set by the engine when this message's operational note already reached
    /// the webhook on an earlier OCC attempt.
    pub operational_already_delivered: bool,
}

/// Result of one subgraph run.
#[derive(Debug, Clone)]
pub struct SubgraphOutcome {
    pub code: OutcomeCode,
    /// Detail handed to the consolidator (missing fields, summaries, warnings).
    pub hint: String,
    /// Single allowed continuation hop.
    pub reroute: Option<Flow>,
    /// Set when this run delivered an operational note to the webhook.
    pub operational_delivered: bool,
}

impl SubgraphOutcome {
    pub fn new(code: OutcomeCode) -> Self {
        Self {
            code,
            hint: String::new(),
            reroute: None,
            operational_delivered: false,
        }
    }

    pub fn with_hint(code: OutcomeCode, hint: impl Into<String>) -> Self {
        Self {
            code,
            hint: hint.into(),
            reroute: None,
            operational_delivered: false,
        }
    }
}

/// Run the selected subgraph once.
pub async fn dispatch(
    flow: Flow,
    state: &mut SessionState,
    text: &str,
    decision: &RouteDecision,
    ctx: &TurnContext<'_>,
) -> Result<SubgraphOutcome, PlantaoError> {
    let confirmation: Option<ConfirmationVerdict> = decision.confirmation;
    let operational: Option<&OperationalNote> = decision.operational.as_ref();
    match flow {
        Flow::Escala => escala::run(state, text, confirmation, ctx).await,
        Flow::Clinico => clinico::run(state, text, confirmation, ctx).await,
        Flow::Operacional => operacional::run(state, text, operational, ctx).await,
        Flow::Finalizar => finalizar::run(state, text, confirmation, ctx).await,
        Flow::Auxiliar => Ok(auxiliar::run(state)),
    }
}

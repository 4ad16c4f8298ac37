// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-message turn pipeline.
//!
//! Idempotency check → session lock → OCC loop (load → bootstrap → route →
//! subgraph → consolidate → conditional save) → buffer appends → idempotency
//! record → unlock. State is never partially written: the OCC save is the
//! last mutation of the loop body.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use plantao_config::model::EngineConfig;
use plantao_core::state::{ResumeAfter, SessionState};
use plantao_core::types::{canonical_session_id, mask_phone, BufferEntry, Direction, Flow};
use plantao_core::{LlmGateway, PlantaoError, SessionStore, ShiftBackend};
use plantao_router::{route, Gate, RouteDecision};

use crate::bootstrap::ensure_bootstrap;
use crate::fiscal;
use crate::subgraphs::{dispatch, SubgraphOutcome, TurnContext};

/// One inbound caregiver message.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub message_id: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub text: String,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
    #[serde(skip)]
    pub idempotency_key: Option<String>,
}

/// The JSON body returned to the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub reply: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub status: String,
    #[serde(rename = "outcomeCode")]
    pub outcome_code: String,
}

/// Engine verdict for one delivery.
#[derive(Debug)]
pub enum EngineResponse {
    /// Fresh processing; the gateway serializes the response.
    Fresh {
        status_code: u16,
        response: IngestResponse,
    },
    /// Idempotent replay; the cached body is returned verbatim.
    Replayed { status_code: u16, body: String },
}

/// A `template-fired` notification from the WhatsApp gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateEvent {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub template: String,
    #[serde(default)]
    pub metadata: Option<TemplateMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub hint_campos_faltantes: Option<Vec<String>>,
    #[serde(rename = "finishReminderSent", default)]
    pub finish_reminder_sent: Option<bool>,
    #[serde(rename = "shiftDay", default)]
    pub shift_day: Option<String>,
}

/// The session-scoped orchestration engine. Constructed once; everything it
/// needs is injected. No process-wide mutable state lives here.
pub struct Engine {
    store: Arc<dyn SessionStore>,
    llm: Arc<dyn LlmGateway>,
    backend: Arc<dyn ShiftBackend>,
    config: EngineConfig,
    instance_id: String,
}

impl Engine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        llm: Arc<dyn LlmGateway>,
        backend: Arc<dyn ShiftBackend>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            llm,
            backend,
            config,
            instance_id: uuid::Uuid::new_v4().simple().to_string()[..8].to_string(),
        }
    }

    /// Process one delivery end to end.
    pub async fn handle_message(
        &self,
        request: IngestRequest,
    ) -> Result<EngineResponse, PlantaoError> {
        let session_id = canonical_session_id(&request.phone_number);
        if session_id.is_empty() {
            return Err(PlantaoError::InvalidInput(format!(
                "phone number '{}' carries no digits",
                request.phone_number
            )));
        }
        if request.message_id.trim().is_empty() {
            return Err(PlantaoError::InvalidInput("message_id is empty".into()));
        }

        let idempotency_key = request
            .idempotency_key
            .clone()
            .unwrap_or_else(|| request.message_id.clone());

        // Replayed deliveries return the recorded response verbatim, without
        // invoking the engine.
        if let Some(record) = self.store.get_idempotent(&idempotency_key).await? {
            debug!(key = idempotency_key.as_str(), "idempotent replay");
            return Ok(EngineResponse::Replayed {
                status_code: record.status_code,
                body: record.response_body,
            });
        }

        // Malformed-but-attributable input: reply without advancing state.
        if request.text.trim().is_empty() {
            return Ok(EngineResponse::Fresh {
                status_code: 200,
                response: IngestResponse {
                    reply: "Desculpe, não entendi. Pode repetir?".into(),
                    session_id,
                    status: "success".into(),
                    outcome_code: "help_generic".into(),
                },
            });
        }

        let resource = format!("session:{session_id}");
        let owner = format!("{}#{}", self.instance_id, uuid::Uuid::new_v4().simple());
        if !self.acquire_lock_bounded(&resource, &owner).await? {
            info!(session = %mask_phone(&session_id), "session busy, lock denied");
            return Ok(EngineResponse::Fresh {
                status_code: 429,
                response: IngestResponse {
                    reply: "Estamos processando sua mensagem anterior. Aguarde um instante e reenvie.".into(),
                    session_id,
                    status: "busy".into(),
                    outcome_code: "busy".into(),
                },
            });
        }

        let deadline = Duration::from_secs(self.config.request_deadline_secs);
        let turn = tokio::time::timeout(
            deadline,
            self.run_turn(&session_id, &request, &idempotency_key),
        )
        .await;

        let released = self.store.release_lock(&resource, &owner).await;
        if let Err(err) = released {
            warn!(error = %err, "lock release failed; lease will expire");
        }

        match turn {
            Ok(result) => result,
            Err(_elapsed) => {
                warn!(session = %mask_phone(&session_id), "request deadline exceeded");
                Ok(EngineResponse::Fresh {
                    status_code: 408,
                    response: IngestResponse {
                        reply: "O processamento demorou mais que o esperado. Tente novamente.".into(),
                        session_id,
                        status: "error".into(),
                        outcome_code: "timeout".into(),
                    },
                })
            }
        }
    }

    async fn acquire_lock_bounded(
        &self,
        resource: &str,
        owner: &str,
    ) -> Result<bool, PlantaoError> {
        for attempt in 0..self.config.lock_retries {
            if self
                .store
                .acquire_lock(resource, owner, self.config.lock_lease_ms)
                .await?
            {
                return Ok(true);
            }
            let jitter = u64::from(chrono::Utc::now().timestamp_subsec_millis() % 50);
            let backoff = Duration::from_millis(100u64 * (1u64 << attempt) + jitter);
            tokio::time::sleep(backoff).await;
        }
        Ok(false)
    }

    /// The OCC loop: reload-and-replay on conflict, bounded. Operational
    /// webhook delivery happens at most once across attempts.
    async fn run_turn(
        &self,
        session_id: &str,
        request: &IngestRequest,
        idempotency_key: &str,
    ) -> Result<EngineResponse, PlantaoError> {
        let mut operational_delivered = false;

        for attempt in 0..self.config.occ_retries {
            let (mut state, version) = self.store.load_session(session_id).await?;
            let now_epoch = chrono::Utc::now().timestamp();
            state.prune_expired_action(now_epoch);

            ensure_bootstrap(&mut state, self.backend.as_ref()).await?;
            state.last_user_text = Some(request.text.clone());

            let decision = route(&state, &request.text, now_epoch, self.llm.as_ref()).await?;
            debug!(flow = %decision.flow, gate = ?decision.gate, attempt, "message routed");

            let ctx = TurnContext {
                llm: self.llm.as_ref(),
                backend: self.backend.as_ref(),
                store: self.store.as_ref(),
                config: &self.config,
                now_epoch,
                operational_already_delivered: operational_delivered,
            };
            let outcome = self
                .run_subgraphs(&mut state, &request.text, &decision, &ctx)
                .await?;
            if outcome.operational_delivered {
                operational_delivered = true;
            }

            let reply =
                fiscal::consolidate(&state, outcome.code, &outcome.hint, self.llm.as_ref()).await;
            state.last_reply_code = Some(outcome.code.to_string());
            state.updated_at = Some(chrono::Utc::now().to_rfc3339());

            match self.store.save_session(&state, version).await {
                Ok(new_version) => {
                    debug!(version = new_version, "session state persisted");
                    let response = IngestResponse {
                        reply,
                        session_id: session_id.to_string(),
                        status: "success".into(),
                        outcome_code: outcome.code.to_string(),
                    };
                    self.record_turn(session_id, request, idempotency_key, &response)
                        .await;
                    return Ok(EngineResponse::Fresh {
                        status_code: 200,
                        response,
                    });
                }
                Err(PlantaoError::Conflict { .. }) => {
                    warn!(attempt, "OCC conflict, reloading and replaying");
                    continue;
                }
                Err(err) => return Err(err),
            }
        }

        // Retry budget exhausted; state is unchanged by this delivery.
        Ok(EngineResponse::Fresh {
            status_code: 200,
            response: IngestResponse {
                reply: "Recebemos mensagens simultâneas e não conseguimos processar esta. Tente novamente.".into(),
                session_id: session_id.to_string(),
                status: "error".into(),
                outcome_code: "conflict".into(),
            },
        })
    }

    /// Dispatch the selected subgraph, honoring at most one continuation hop.
    async fn run_subgraphs(
        &self,
        state: &mut SessionState,
        text: &str,
        decision: &RouteDecision,
        ctx: &TurnContext<'_>,
    ) -> Result<SubgraphOutcome, PlantaoError> {
        // Vitals sent before the attendance answer are parked in the clinical
        // buffer; the flow resumes right after a successful presence commit.
        if decision.gate == Gate::AttendanceGate {
            self.park_clinical_content(state, text).await;
        }

        let first = dispatch(decision.flow, state, text, decision, ctx).await?;
        let Some(next_flow) = first.reroute else {
            return Ok(first);
        };

        debug!(from = %decision.flow, to = %next_flow, "continuation hop");
        let hop_decision = RouteDecision {
            flow: next_flow,
            gate: decision.gate,
            confirmation: None,
            operational: None,
        };
        let hop_ctx = TurnContext {
            operational_already_delivered: ctx.operational_already_delivered
                || first.operational_delivered,
            ..*ctx
        };
        let mut second = dispatch(next_flow, state, text, &hop_decision, &hop_ctx).await?;
        // Any further re-route waits for the next message.
        second.reroute = None;
        second.operational_delivered |= first.operational_delivered;
        if !first.hint.is_empty() {
            second.hint = if second.hint.is_empty() {
                first.hint
            } else {
                format!("{}\n{}", first.hint, second.hint)
            };
        }
        Ok(second)
    }

    /// Extract and park clinical content carried by a message the attendance
    /// gate diverted. Extraction failures just skip the parking.
    async fn park_clinical_content(&self, state: &mut SessionState, text: &str) {
        match self.llm.extract_clinical(text).await {
            Ok(extraction) if !extraction.is_empty() => {
                crate::subgraphs::clinico::merge_extraction(state, &extraction);
                state.resume_after = Some(ResumeAfter {
                    flow: Flow::Clinico,
                    reason: "need_presence_first".to_string(),
                });
                debug!("clinical content parked until presence is confirmed");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "could not inspect diverted message for clinical content");
            }
        }
    }

    /// Buffer appends and the idempotency record. Failures here are logged,
    /// never surfaced: the state write already succeeded.
    async fn record_turn(
        &self,
        session_id: &str,
        request: &IngestRequest,
        idempotency_key: &str,
        response: &IngestResponse,
    ) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let inbound = BufferEntry {
            created_at_epoch: now_ms,
            direction: Direction::In,
            text: request.text.clone(),
            message_id: request.message_id.clone(),
            meta: request.meta.clone(),
        };
        if let Err(err) = self.store.append_buffer(session_id, &inbound).await {
            warn!(error = %err, "inbound buffer append failed");
        }
        let outbound = BufferEntry {
            created_at_epoch: now_ms + 1,
            direction: Direction::Out,
            text: response.reply.clone(),
            message_id: format!("{}:reply", request.message_id),
            meta: Some(serde_json::json!({ "outcomeCode": response.outcome_code })),
        };
        if let Err(err) = self.store.append_buffer(session_id, &outbound).await {
            warn!(error = %err, "outbound buffer append failed");
        }

        match serde_json::to_string(response) {
            Ok(body) => {
                if let Err(err) = self.store.put_idempotent(idempotency_key, 200, &body).await {
                    warn!(error = %err, "idempotency record failed");
                }
            }
            Err(err) => warn!(error = %err, "response serialization for idempotency failed"),
        }
    }

    /// Merge template hints into the session under the lock.
    pub async fn handle_template_event(&self, event: TemplateEvent) -> Result<(), PlantaoError> {
        let session_id = canonical_session_id(&event.phone_number);
        if session_id.is_empty() {
            return Err(PlantaoError::InvalidInput(
                "template event carries no phone digits".into(),
            ));
        }

        let resource = format!("session:{session_id}");
        let owner = format!("{}#{}", self.instance_id, uuid::Uuid::new_v4().simple());
        if !self.acquire_lock_bounded(&resource, &owner).await? {
            return Err(PlantaoError::LockDenied { resource });
        }

        let result = self.apply_template_hints(&session_id, &event).await;

        if let Err(err) = self.store.release_lock(&resource, &owner).await {
            warn!(error = %err, "lock release failed; lease will expire");
        }
        result
    }

    async fn apply_template_hints(
        &self,
        session_id: &str,
        event: &TemplateEvent,
    ) -> Result<(), PlantaoError> {
        for _ in 0..self.config.occ_retries {
            let (mut state, version) = self.store.load_session(session_id).await?;
            ensure_bootstrap(&mut state, self.backend.as_ref()).await?;

            let metadata = event.metadata.clone().unwrap_or_default();
            let is_finish_template = event.template.to_lowercase().contains("finalizacao");
            if metadata.finish_reminder_sent == Some(true) || is_finish_template {
                state.shift.finish_reminder_sent = true;
            }
            if let Some(shift_day) = metadata.shift_day {
                state.shift.shift_day = Some(shift_day);
            }
            state.updated_at = Some(chrono::Utc::now().to_rfc3339());

            match self.store.save_session(&state, version).await {
                Ok(_) => {
                    let entry = BufferEntry {
                        created_at_epoch: chrono::Utc::now().timestamp_millis(),
                        direction: Direction::Out,
                        text: format!("[template] {}", event.template),
                        message_id: uuid::Uuid::new_v4().to_string(),
                        meta: metadata
                            .hint_campos_faltantes
                            .map(|hints| serde_json::json!({ "hint_campos_faltantes": hints })),
                    };
                    if let Err(err) = self.store.append_buffer(session_id, &entry).await {
                        warn!(error = %err, "template buffer append failed");
                    }
                    info!(template = event.template.as_str(), "template hints merged");
                    return Ok(());
                }
                Err(PlantaoError::Conflict { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(PlantaoError::Conflict {
            session_id: session_id.to_string(),
            expected: 0,
        })
    }

    /// Readiness probe: persistence round-trip and backend circuit state.
    pub async fn readiness(&self) -> (bool, bool) {
        let store_ok = self.store.ping().await.is_ok();
        let backend_ok = self.backend.is_reachable();
        (store_ok, backend_ok)
    }
}

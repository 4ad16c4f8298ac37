// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The typed LLM gateway: six calls, schema validation, bounded re-parse
//! retries and a shared circuit breaker.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use plantao_clinical::{parse_respiratory_mode, sanitize};
use plantao_config::model::LlmConfig;
use plantao_core::breaker::{BreakerConfig, CircuitBreaker};
use plantao_core::llm::{
    ClinicalExtraction, ConfirmationVerdict, FinalizationExtraction, Intent,
    IntentClassification, OperationalNote, Urgency,
};
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::{CompactState, FinalizationTopics, SessionState};
use plantao_core::{LlmGateway, PlantaoError};

use crate::client::ChatClient;
use crate::prompts;
use crate::types::{
    ChatMessage, ChatRequest, RawClinical, RawConfirmation, RawFinalization, RawIntent,
    RawOperational, ResponseFormat,
};

/// Maximum characters of a generated reply before truncation.
const MAX_REPLY_CHARS: usize = 600;

/// OpenAI-compatible implementation of [`LlmGateway`].
pub struct OpenAiGateway {
    client: ChatClient,
    intent_model: String,
    extractor_model: String,
    max_parse_retries: u32,
    breaker: CircuitBreaker,
}

impl OpenAiGateway {
    pub fn new(config: &LlmConfig) -> Result<Self, PlantaoError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| PlantaoError::Config("llm.api_key is not set".into()))?;
        let client = ChatClient::new(api_key, &config.base_url, config.timeout_secs)?;
        Ok(Self {
            client,
            intent_model: config.intent_model.clone(),
            extractor_model: config.extractor_model.clone(),
            max_parse_retries: config.max_retries,
            breaker: CircuitBreaker::new(BreakerConfig::default()),
        })
    }

    /// One JSON-mode call with bounded re-parse retries. Transport failures
    /// feed the breaker; malformed JSON costs a fresh call, up to the budget.
    async fn call_json<T: DeserializeOwned>(
        &self,
        model: &str,
        prompt: String,
        max_tokens: u32,
    ) -> Result<T, PlantaoError> {
        if !self.breaker.can_execute() {
            return Err(PlantaoError::LlmUnavailable("circuit open".into()));
        }

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "system".into(),
                content: prompt,
            }],
            temperature: 0.0,
            max_tokens,
            response_format: Some(ResponseFormat::json_object()),
        };

        let mut last_parse_error = None;
        for attempt in 0..=self.max_parse_retries {
            let content = match self.client.complete(&request).await {
                Ok(content) => {
                    self.breaker.record_success();
                    content
                }
                Err(err) => {
                    self.breaker.record_failure();
                    return Err(err);
                }
            };

            match serde_json::from_str::<T>(&content) {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    warn!(attempt, error = %err, "model returned malformed JSON");
                    last_parse_error = Some(err);
                }
            }
        }

        Err(PlantaoError::Llm {
            message: format!(
                "malformed JSON after {} attempts: {}",
                self.max_parse_retries + 1,
                last_parse_error
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            ),
            source: None,
        })
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn classify_intent(
        &self,
        text: &str,
        state: &CompactState,
    ) -> Result<IntentClassification, PlantaoError> {
        let raw: RawIntent = self
            .call_json(&self.intent_model, prompts::intent_prompt(text, state), 100)
            .await?;
        let intent = raw.intent.parse::<Intent>().unwrap_or(Intent::Indefinido);
        let classification = IntentClassification {
            intent,
            confidence: raw.confidence.clamp(0.0, 1.0),
        };
        debug!(intent = %classification.intent, confidence = classification.confidence, "intent classified");
        Ok(classification)
    }

    async fn classify_confirmation(
        &self,
        text: &str,
    ) -> Result<ConfirmationVerdict, PlantaoError> {
        let raw: RawConfirmation = self
            .call_json(&self.intent_model, prompts::confirmation_prompt(text), 50)
            .await?;
        Ok(match raw.decision.as_str() {
            "sim" => ConfirmationVerdict::Yes,
            "nao" | "não" => ConfirmationVerdict::No,
            "cancelar" => ConfirmationVerdict::Cancel,
            _ => ConfirmationVerdict::Unclear,
        })
    }

    async fn detect_operational_note(
        &self,
        text: &str,
    ) -> Result<OperationalNote, PlantaoError> {
        let raw: RawOperational = self
            .call_json(&self.intent_model, prompts::operational_prompt(text), 200)
            .await?;
        let urgency = raw
            .urgency
            .as_deref()
            .and_then(|u| u.parse::<Urgency>().ok())
            .unwrap_or(Urgency::Normal);
        Ok(OperationalNote {
            is_operational: raw.is_operational,
            urgency,
            note: raw.operational_note.filter(|n| !n.trim().is_empty()),
        })
    }

    async fn extract_clinical(&self, text: &str) -> Result<ClinicalExtraction, PlantaoError> {
        let raw: RawClinical = self
            .call_json(&self.extractor_model, prompts::clinical_prompt(text), 400)
            .await?;
        let candidate = ClinicalExtraction {
            pa: raw.vitals.pa,
            hr: raw.vitals.fc,
            rr: raw.vitals.fr,
            sat_o2: raw.vitals.sat,
            temp: raw.vitals.temp,
            respiratory_mode: raw
                .supplementary_oxygen
                .as_deref()
                .and_then(parse_respiratory_mode),
            clinical_note: raw.nota.filter(|n| !n.trim().is_empty()),
            warnings: raw.warnings,
        };
        // The model promises range checks; enforce them regardless.
        Ok(sanitize(candidate))
    }

    async fn extract_finalization_topics(
        &self,
        text: &str,
        already_collected: &FinalizationTopics,
        existing_notes: &[String],
    ) -> Result<FinalizationExtraction, PlantaoError> {
        let raw: RawFinalization = self
            .call_json(
                &self.extractor_model,
                prompts::finalization_prompt(text, already_collected, existing_notes),
                500,
            )
            .await?;
        let clean = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(FinalizationExtraction {
            alimentacao: clean(raw.alimentacao_hidratacao),
            evacuacoes: clean(raw.evacuacoes),
            sono: clean(raw.sono),
            humor: clean(raw.humor),
            medicacoes: clean(raw.medicacoes),
            atividades: clean(raw.atividades),
            adicional_clinico: clean(raw.informacoes_clinicas_adicionais),
            adicional_administrativo: clean(raw.informacoes_administrativas),
        })
    }

    async fn generate_reply(
        &self,
        state: &SessionState,
        outcome: OutcomeCode,
        hint: &str,
    ) -> Result<String, PlantaoError> {
        if !self.breaker.can_execute() {
            return Err(PlantaoError::LlmUnavailable("circuit open".into()));
        }
        let request = ChatRequest {
            model: self.extractor_model.clone(),
            messages: vec![ChatMessage {
                role: "system".into(),
                content: prompts::reply_prompt(state, outcome, hint),
            }],
            temperature: 0.0,
            max_tokens: 250,
            response_format: None,
        };
        let reply = match self.client.complete(&request).await {
            Ok(reply) => {
                self.breaker.record_success();
                reply
            }
            Err(err) => {
                self.breaker.record_failure();
                return Err(err);
            }
        };
        let reply = reply.trim();
        if reply.chars().count() > MAX_REPLY_CHARS {
            Ok(reply.chars().take(MAX_REPLY_CHARS).collect())
        } else {
            Ok(reply.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> OpenAiGateway {
        let config = LlmConfig {
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            ..LlmConfig::default()
        };
        OpenAiGateway::new(&config).unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn classify_intent_parses_and_clamps() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"intent":"clinico","confidence":1.7}"#,
            )))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let state = CompactState::project(&SessionState::new("s1"));
        let result = gateway.classify_intent("pa 120x80", &state).await.unwrap();
        assert_eq!(result.intent, Intent::Clinico);
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn unknown_intent_label_falls_back_to_indefinido() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"intent":"pizza","confidence":0.4}"#,
            )))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let state = CompactState::project(&SessionState::new("s1"));
        let result = gateway.classify_intent("???", &state).await.unwrap();
        assert_eq!(result.intent, Intent::Indefinido);
    }

    #[tokio::test]
    async fn malformed_json_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json at all")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"decision":"sim"}"#,
            )))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let verdict = gateway.classify_confirmation("manda ver").await.unwrap();
        assert_eq!(verdict, ConfirmationVerdict::Yes);
    }

    #[tokio::test]
    async fn clinical_extraction_is_sanitized() {
        let server = MockServer::start().await;
        // The model claims FC 300 and an ambiguous PA; the gateway must null both.
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                r#"{"vitals":{"PA":"12/8","FC":300,"Sat":97},"supplementaryOxygen":"ar ambiente","nota":"paciente estável","warnings":[]}"#,
            )))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let extraction = gateway.extract_clinical("12/8 fc 300 sat 97").await.unwrap();
        assert!(extraction.pa.is_none());
        assert!(extraction.hr.is_none());
        assert_eq!(extraction.sat_o2, Some(97));
        assert!(extraction.warnings.iter().any(|w| w == "PA_ambigua"));
        assert!(extraction.warnings.iter().any(|w| w == "FC_incoerente"));
        assert_eq!(
            extraction.respiratory_mode,
            Some(plantao_core::state::RespiratoryMode::Ambient)
        );
    }

    #[tokio::test]
    async fn generate_reply_truncates_long_output() {
        let server = MockServer::start().await;
        let long = "a".repeat(2000);
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&long)))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let reply = gateway
            .generate_reply(&SessionState::new("s1"), OutcomeCode::HelpGeneric, "")
            .await
            .unwrap();
        assert_eq!(reply.chars().count(), 600);
    }
}

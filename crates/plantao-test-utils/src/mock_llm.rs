// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM gateway with scripted typed responses.
//!
//! Responses are popped from FIFO queues per call type; empty queues fall
//! back to conservative defaults (indefinite intent, unclear confirmation,
//! not operational, empty extraction). `generate_reply` is unavailable by
//! default so the consolidator exercises its deterministic templates.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use plantao_core::llm::{
    ClinicalExtraction, ConfirmationVerdict, FinalizationExtraction, Intent,
    IntentClassification, OperationalNote, Urgency,
};
use plantao_core::outcome::OutcomeCode;
use plantao_core::state::{CompactState, FinalizationTopics, SessionState};
use plantao_core::{LlmGateway, PlantaoError};

/// Scripted LLM gateway for deterministic, CI-runnable tests.
#[derive(Default)]
pub struct MockLlm {
    unavailable: bool,
    intents: Mutex<VecDeque<IntentClassification>>,
    confirmations: Mutex<VecDeque<ConfirmationVerdict>>,
    operationals: Mutex<VecDeque<OperationalNote>>,
    clinicals: Mutex<VecDeque<ClinicalExtraction>>,
    finalizations: Mutex<VecDeque<FinalizationExtraction>>,
    replies: Mutex<VecDeque<String>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `LlmUnavailable` (open-circuit simulation).
    pub fn with_unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_intent(self, intent: Intent, confidence: f32) -> Self {
        self.intents
            .lock()
            .unwrap()
            .push_back(IntentClassification { intent, confidence });
        self
    }

    pub fn with_confirmation(self, verdict: ConfirmationVerdict) -> Self {
        self.confirmations.lock().unwrap().push_back(verdict);
        self
    }

    pub fn with_operational(self, note: &str, urgency: Urgency) -> Self {
        self.operationals.lock().unwrap().push_back(OperationalNote {
            is_operational: true,
            urgency,
            note: Some(note.to_string()),
        });
        self
    }

    /// Queue a "not operational" verdict (useful to script call order).
    pub fn with_non_operational(self) -> Self {
        self.operationals.lock().unwrap().push_back(OperationalNote {
            is_operational: false,
            urgency: Urgency::Low,
            note: None,
        });
        self
    }

    pub fn with_clinical(self, extraction: ClinicalExtraction) -> Self {
        self.clinicals.lock().unwrap().push_back(extraction);
        self
    }

    pub fn with_finalization(self, extraction: FinalizationExtraction) -> Self {
        self.finalizations.lock().unwrap().push_back(extraction);
        self
    }

    pub fn with_reply(self, reply: &str) -> Self {
        self.replies.lock().unwrap().push_back(reply.to_string());
        self
    }

    fn check_available(&self) -> Result<(), PlantaoError> {
        if self.unavailable {
            Err(PlantaoError::LlmUnavailable("mock circuit open".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LlmGateway for MockLlm {
    async fn classify_intent(
        &self,
        _text: &str,
        _state: &CompactState,
    ) -> Result<IntentClassification, PlantaoError> {
        self.check_available()?;
        Ok(self
            .intents
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(IntentClassification {
                intent: Intent::Indefinido,
                confidence: 0.0,
            }))
    }

    async fn classify_confirmation(
        &self,
        _text: &str,
    ) -> Result<ConfirmationVerdict, PlantaoError> {
        self.check_available()?;
        Ok(self
            .confirmations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConfirmationVerdict::Unclear))
    }

    async fn detect_operational_note(
        &self,
        _text: &str,
    ) -> Result<OperationalNote, PlantaoError> {
        self.check_available()?;
        Ok(self
            .operationals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OperationalNote {
                is_operational: false,
                urgency: Urgency::Low,
                note: None,
            }))
    }

    async fn extract_clinical(&self, _text: &str) -> Result<ClinicalExtraction, PlantaoError> {
        self.check_available()?;
        Ok(self
            .clinicals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn extract_finalization_topics(
        &self,
        _text: &str,
        _already_collected: &FinalizationTopics,
        _existing_notes: &[String],
    ) -> Result<FinalizationExtraction, PlantaoError> {
        self.check_available()?;
        Ok(self
            .finalizations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn generate_reply(
        &self,
        _state: &SessionState,
        _outcome: OutcomeCode,
        _hint: &str,
    ) -> Result<String, PlantaoError> {
        self.check_available()?;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PlantaoError::LlmUnavailable("no scripted reply".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_responses_pop_in_order_then_default() {
        let llm = MockLlm::new()
            .with_intent(Intent::Escala, 0.9)
            .with_intent(Intent::Clinico, 0.8);
        let state = CompactState::project(&SessionState::new("s1"));

        assert_eq!(
            llm.classify_intent("a", &state).await.unwrap().intent,
            Intent::Escala
        );
        assert_eq!(
            llm.classify_intent("b", &state).await.unwrap().intent,
            Intent::Clinico
        );
        assert_eq!(
            llm.classify_intent("c", &state).await.unwrap().intent,
            Intent::Indefinido
        );
    }

    #[tokio::test]
    async fn unavailable_fails_every_call() {
        let llm = MockLlm::new().with_unavailable();
        let err = llm.classify_confirmation("sim").await.unwrap_err();
        assert!(matches!(err, PlantaoError::LlmUnavailable(_)));
    }

    #[tokio::test]
    async fn reply_defaults_to_unavailable() {
        let llm = MockLlm::new();
        let err = llm
            .generate_reply(&SessionState::new("s1"), OutcomeCode::HelpGeneric, "")
            .await
            .unwrap_err();
        assert!(matches!(err, PlantaoError::LlmUnavailable(_)));
    }
}

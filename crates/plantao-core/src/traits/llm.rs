// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM gateway seam: six strictly-typed calls.
//!
//! Implementations validate the model output against the typed schema, retry
//! a bounded number of times on malformed JSON, and return
//! [`PlantaoError::LlmUnavailable`] while their circuit is open.

use async_trait::async_trait;

use crate::error::PlantaoError;
use crate::llm::{
    ClinicalExtraction, ConfirmationVerdict, FinalizationExtraction, IntentClassification,
    OperationalNote,
};
use crate::outcome::OutcomeCode;
use crate::state::{CompactState, FinalizationTopics, SessionState};

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Classify the caregiver's message into one of the subgraph intents.
    async fn classify_intent(
        &self,
        text: &str,
        state: &CompactState,
    ) -> Result<IntentClassification, PlantaoError>;

    /// Classify a free-text answer to a staged confirmation prompt.
    async fn classify_confirmation(
        &self,
        text: &str,
    ) -> Result<ConfirmationVerdict, PlantaoError>;

    /// Detect urgent operational content (supplies, infrastructure, visitors).
    async fn detect_operational_note(
        &self,
        text: &str,
    ) -> Result<OperationalNote, PlantaoError>;

    /// Extract vitals, respiratory mode and clinical note. Out-of-range
    /// values come back as `None` plus a warning code; ambiguous blood
    /// pressure comes back as `None` plus `"PA_ambigua"`.
    async fn extract_clinical(&self, text: &str) -> Result<ClinicalExtraction, PlantaoError>;

    /// Fill finalization topics from the message; never invents values.
    async fn extract_finalization_topics(
        &self,
        text: &str,
        already_collected: &FinalizationTopics,
        existing_notes: &[String],
    ) -> Result<FinalizationExtraction, PlantaoError>;

    /// Produce the single user-visible reply for the turn. The consolidator
    /// re-checks the hard guards on whatever comes back.
    async fn generate_reply(
        &self,
        state: &SessionState,
        outcome: OutcomeCode,
        hint: &str,
    ) -> Result<String, PlantaoError>;
}

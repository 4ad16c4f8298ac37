// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the chat-completions API and the raw JSON shapes the
//! models are instructed to return.

use serde::{Deserialize, Serialize};

/// Request body for a chat completion.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Response body of a chat completion (the fields we consume).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

/// Error envelope the API returns on non-2xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    pub message: String,
}

// --- Raw model output shapes (validated before leaving the gateway) ---

#[derive(Debug, Deserialize)]
pub struct RawIntent {
    pub intent: String,
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
pub struct RawConfirmation {
    pub decision: String,
}

#[derive(Debug, Deserialize)]
pub struct RawOperational {
    pub is_operational: bool,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub operational_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawVitals {
    #[serde(rename = "PA")]
    pub pa: Option<String>,
    #[serde(rename = "FC")]
    pub fc: Option<i32>,
    #[serde(rename = "FR")]
    pub fr: Option<i32>,
    #[serde(rename = "Sat")]
    pub sat: Option<i32>,
    #[serde(rename = "Temp")]
    pub temp: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawClinical {
    pub vitals: RawVitals,
    #[serde(rename = "supplementaryOxygen")]
    pub supplementary_oxygen: Option<String>,
    pub nota: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFinalization {
    pub alimentacao_hidratacao: Option<String>,
    pub evacuacoes: Option<String>,
    pub sono: Option<String>,
    pub humor: Option<String>,
    pub medicacoes: Option<String>,
    pub atividades: Option<String>,
    pub informacoes_clinicas_adicionais: Option<String>,
    pub informacoes_administrativas: Option<String>,
    pub topicos_identificados: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_with_json_mode() {
        let request = ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage {
                role: "system".into(),
                content: "responda JSON".into(),
            }],
            temperature: 0.0,
            max_tokens: 300,
            response_format: Some(ResponseFormat::json_object()),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"response_format\":{\"type\":\"json_object\"}"));
        assert!(json.contains("\"temperature\":0.0"));
    }

    #[test]
    fn raw_clinical_tolerates_missing_fields() {
        let raw: RawClinical =
            serde_json::from_str(r#"{"vitals":{"PA":"120x80"},"nota":null}"#).unwrap();
        assert_eq!(raw.vitals.pa.as_deref(), Some("120x80"));
        assert!(raw.nota.is_none());
        assert!(raw.warnings.is_empty());
    }

    #[test]
    fn chat_response_extracts_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"{\"intent\":\"clinico\"}"}}]}"#,
        )
        .unwrap();
        assert!(response.choices[0]
            .message
            .content
            .as_deref()
            .unwrap()
            .contains("clinico"));
    }
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Plantão crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Subgraph flows the router can select.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Escala,
    Clinico,
    Operacional,
    Finalizar,
    Auxiliar,
}

/// Flow of a staged two-phase-commit action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionFlow {
    EscalaCommit,
    ClinicalCommit,
    FinalizeCommit,
}

impl ActionFlow {
    /// The subgraph that executes this action on confirmation.
    pub fn target_flow(self) -> Flow {
        match self {
            ActionFlow::EscalaCommit => Flow::Escala,
            ActionFlow::ClinicalCommit => Flow::Clinico,
            ActionFlow::FinalizeCommit => Flow::Finalizar,
        }
    }
}

/// Lifecycle of a pending action: `staged -> confirmed -> executed` or `staged -> cancelled`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Staged,
    Confirmed,
    Executed,
    Cancelled,
}

impl ActionStatus {
    /// Whether `self -> to` is a legal transition. A confirmed action may
    /// still be cancelled when its execution fails permanently.
    pub fn can_transition_to(self, to: ActionStatus) -> bool {
        matches!(
            (self, to),
            (ActionStatus::Staged, ActionStatus::Confirmed)
                | (ActionStatus::Staged, ActionStatus::Cancelled)
                | (ActionStatus::Confirmed, ActionStatus::Executed)
                | (ActionStatus::Confirmed, ActionStatus::Cancelled)
        )
    }
}

/// A staged action awaiting caregiver confirmation before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// UUID of the action; carried into backend payloads for idempotency.
    pub action_id: String,
    pub flow: ActionFlow,
    /// Opaque payload handed to the executing subgraph.
    pub payload: serde_json::Value,
    /// Human-readable description shown in the confirmation prompt.
    pub description: String,
    pub status: ActionStatus,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Epoch seconds after which the action is treated as absent.
    pub expires_at: i64,
}

impl PendingAction {
    pub fn is_expired(&self, now_epoch: i64) -> bool {
        now_epoch >= self.expires_at
    }

    /// Staged and still within its confirmation window.
    pub fn is_awaiting_confirmation(&self, now_epoch: i64) -> bool {
        self.status == ActionStatus::Staged && !self.is_expired(now_epoch)
    }
}

/// Direction of a conversation buffer entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

/// One temporally ordered entry of a session's conversation buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferEntry {
    /// Epoch milliseconds; partition-sort key within a session.
    pub created_at_epoch: i64,
    pub direction: Direction,
    pub text: String,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Cached response for an idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotentRecord {
    pub status_code: u16,
    pub response_body: String,
    /// Epoch seconds at creation.
    pub created_at: i64,
}

/// Canonical session id for a caregiver phone number: digits only, leading `+`
/// and separators stripped.
pub fn canonical_session_id(phone_number: &str) -> String {
    phone_number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Masked rendering of a phone number for log fields.
pub fn mask_phone(phone_number: &str) -> String {
    let digits = canonical_session_id(phone_number);
    if digits.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &digits[..4])
}

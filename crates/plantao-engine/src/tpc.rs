// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase-commit helpers: staging actions that execute only after the
//! caregiver confirms. Not the database protocol of the same name.

use plantao_core::types::{ActionFlow, ActionStatus, PendingAction};

/// Stage a new action awaiting confirmation.
pub fn stage_action(
    flow: ActionFlow,
    payload: serde_json::Value,
    description: impl Into<String>,
    now_epoch: i64,
    expiry_minutes: i64,
) -> PendingAction {
    PendingAction {
        action_id: uuid::Uuid::new_v4().to_string(),
        flow,
        payload,
        description: description.into(),
        status: ActionStatus::Staged,
        created_at: chrono::Utc::now().to_rfc3339(),
        expires_at: now_epoch + expiry_minutes * 60,
    }
}

/// Confirmation prompt shown to the caregiver for a staged action.
pub fn confirmation_prompt(action: &PendingAction) -> String {
    format!(
        "{}\n\nResponda *sim* para confirmar ou *não* para cancelar.",
        action.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_action_expires_after_window() {
        let action = stage_action(
            ActionFlow::ClinicalCommit,
            serde_json::json!({"reportID": "r1"}),
            "Salvar os sinais vitais?",
            1_000,
            10,
        );
        assert_eq!(action.status, ActionStatus::Staged);
        assert_eq!(action.expires_at, 1_000 + 600);
        assert!(action.is_awaiting_confirmation(1_599));
        assert!(!action.is_awaiting_confirmation(1_600));
    }

    #[test]
    fn prompt_embeds_description() {
        let action = stage_action(
            ActionFlow::EscalaCommit,
            serde_json::json!({}),
            "Confirmar presença no plantão?",
            0,
            10,
        );
        let prompt = confirmation_prompt(&action);
        assert!(prompt.contains("Confirmar presença"));
        assert!(prompt.contains("*sim*"));
    }
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-action audit records with state-machine-safe transitions.

use plantao_core::types::{ActionStatus, PendingAction};
use plantao_core::PlantaoError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, Database};

/// Insert or replace the audit copy of a pending action.
pub async fn put_pending_action(
    db: &Database,
    session_id: &str,
    action: &PendingAction,
) -> Result<(), PlantaoError> {
    let session_id = session_id.to_string();
    let action = action.clone();
    let payload = serde_json::to_string(&action.payload).map_err(PlantaoError::storage)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO pending_actions
                 (session_id, action_id, flow, description, payload, status, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    session_id,
                    action.action_id,
                    action.flow.to_string(),
                    action.description,
                    payload,
                    action.status.to_string(),
                    action.created_at,
                    action.expires_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Update an action's status only along a legal edge and only when the stored
/// status is `from`. Illegal edges and lost races surface as `Conflict`.
pub async fn transition_pending_action(
    db: &Database,
    session_id: &str,
    action_id: &str,
    from: ActionStatus,
    to: ActionStatus,
) -> Result<(), PlantaoError> {
    if !from.can_transition_to(to) {
        return Err(PlantaoError::InvariantViolation(format!(
            "illegal pending-action transition {from} -> {to}"
        )));
    }

    let sid = session_id.to_string();
    let aid = action_id.to_string();
    let changed: usize = db
        .connection()
        .call(move |conn| {
            let changes = conn.execute(
                "UPDATE pending_actions SET status = ?4
                 WHERE session_id = ?1 AND action_id = ?2 AND status = ?3",
                params![sid, aid, from.to_string(), to.to_string()],
            )?;
            Ok(changes)
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 1 {
        Ok(())
    } else {
        Err(PlantaoError::Conflict {
            session_id: session_id.to_string(),
            expected: 0,
        })
    }
}

/// Fetch the stored status of an action (debug/audit reads).
pub async fn get_action_status(
    db: &Database,
    session_id: &str,
    action_id: &str,
) -> Result<Option<ActionStatus>, PlantaoError> {
    let sid = session_id.to_string();
    let aid = action_id.to_string();
    let status: Option<String> = db
        .connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    "SELECT status FROM pending_actions
                     WHERE session_id = ?1 AND action_id = ?2",
                    params![sid, aid],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)?;

    match status {
        Some(s) => s
            .parse::<ActionStatus>()
            .map(Some)
            .map_err(PlantaoError::storage),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_core::types::ActionFlow;

    fn staged_action(id: &str) -> PendingAction {
        PendingAction {
            action_id: id.to_string(),
            flow: ActionFlow::EscalaCommit,
            payload: serde_json::json!({"scheduleIdentifier": "sch-1"}),
            description: "Confirmar presença no plantão?".into(),
            status: ActionStatus::Staged,
            created_at: "2026-08-02T10:00:00Z".into(),
            expires_at: i64::MAX,
        }
    }

    #[tokio::test]
    async fn staged_confirmed_executed_path() {
        let db = Database::open_in_memory().await.unwrap();
        put_pending_action(&db, "s1", &staged_action("a1")).await.unwrap();

        transition_pending_action(&db, "s1", "a1", ActionStatus::Staged, ActionStatus::Confirmed)
            .await
            .unwrap();
        transition_pending_action(&db, "s1", "a1", ActionStatus::Confirmed, ActionStatus::Executed)
            .await
            .unwrap();

        let status = get_action_status(&db, "s1", "a1").await.unwrap();
        assert_eq!(status, Some(ActionStatus::Executed));
    }

    #[tokio::test]
    async fn staged_cancelled_path() {
        let db = Database::open_in_memory().await.unwrap();
        put_pending_action(&db, "s1", &staged_action("a2")).await.unwrap();
        transition_pending_action(&db, "s1", "a2", ActionStatus::Staged, ActionStatus::Cancelled)
            .await
            .unwrap();
        let status = get_action_status(&db, "s1", "a2").await.unwrap();
        assert_eq!(status, Some(ActionStatus::Cancelled));
    }

    #[tokio::test]
    async fn illegal_edge_is_rejected_before_touching_storage() {
        let db = Database::open_in_memory().await.unwrap();
        put_pending_action(&db, "s1", &staged_action("a3")).await.unwrap();
        let err = transition_pending_action(
            &db,
            "s1",
            "a3",
            ActionStatus::Staged,
            ActionStatus::Executed,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PlantaoError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn stale_from_status_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        put_pending_action(&db, "s1", &staged_action("a4")).await.unwrap();
        transition_pending_action(&db, "s1", "a4", ActionStatus::Staged, ActionStatus::Cancelled)
            .await
            .unwrap();
        // Action is already cancelled; confirming from `staged` must fail.
        let err = transition_pending_action(
            &db,
            "s1",
            "a4",
            ActionStatus::Staged,
            ActionStatus::Confirmed,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PlantaoError::Conflict { .. }));
    }
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session state reads and optimistic-concurrency writes.

use plantao_core::{PlantaoError, SessionState};
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, now_rfc3339, Database};

/// Load a session state and its version. Missing sessions yield a default
/// state with version 0.
pub async fn load_session(
    db: &Database,
    session_id: &str,
) -> Result<(SessionState, i64), PlantaoError> {
    let id = session_id.to_string();
    let row: Option<(String, i64)> = db
        .connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    "SELECT state, version FROM sessions WHERE session_id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)?;

    match row {
        Some((state_json, version)) => {
            let state: SessionState =
                serde_json::from_str(&state_json).map_err(PlantaoError::storage)?;
            Ok((state, version))
        }
        None => Ok((SessionState::new(session_id), 0)),
    }
}

/// Conditional write: succeeds only while the stored version equals
/// `expected_version`, then stores `expected_version + 1`.
///
/// `expected_version == 0` means "the row must not exist yet".
pub async fn save_session(
    db: &Database,
    state: &SessionState,
    expected_version: i64,
) -> Result<i64, PlantaoError> {
    let session_id = state.session_id.clone();
    let state_json = serde_json::to_string(state).map_err(PlantaoError::storage)?;
    let new_version = expected_version + 1;
    let now = now_rfc3339();

    let id = session_id.clone();
    let written: bool = db
        .connection()
        .call(move |conn| {
            let changes = if expected_version == 0 {
                conn.execute(
                    "INSERT OR IGNORE INTO sessions (session_id, version, state, updated_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, new_version, state_json, now],
                )?
            } else {
                conn.execute(
                    "UPDATE sessions SET version = ?2, state = ?3, updated_at = ?4
                     WHERE session_id = ?1 AND version = ?5",
                    params![id, new_version, state_json, now, expected_version],
                )?
            };
            Ok(changes == 1)
        })
        .await
        .map_err(map_tr_err)?;

    if written {
        Ok(new_version)
    } else {
        Err(PlantaoError::Conflict {
            session_id,
            expected: expected_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn missing_session_loads_default_with_version_zero() {
        let db = setup_db().await;
        let (state, version) = load_session(&db, "5511999999999").await.unwrap();
        assert_eq!(version, 0);
        assert_eq!(state.session_id, "5511999999999");
        assert_eq!(state.phone_number, "5511999999999");
    }

    #[tokio::test]
    async fn save_then_load_round_trips_with_incremented_version() {
        let db = setup_db().await;
        let (mut state, version) = load_session(&db, "s1").await.unwrap();
        state.shift.shift_allow = true;

        let v1 = save_session(&db, &state, version).await.unwrap();
        assert_eq!(v1, 1);

        let (loaded, version) = load_session(&db, "s1").await.unwrap();
        assert_eq!(version, 1);
        assert!(loaded.shift.shift_allow);
    }

    #[tokio::test]
    async fn version_increases_strictly_by_one_per_write() {
        let db = setup_db().await;
        let (state, mut version) = load_session(&db, "s2").await.unwrap();
        for expected in 1..=5 {
            version = save_session(&db, &state, version).await.unwrap();
            assert_eq!(version, expected);
        }
    }

    #[tokio::test]
    async fn stale_version_conflicts() {
        let db = setup_db().await;
        let (state, version) = load_session(&db, "s3").await.unwrap();
        save_session(&db, &state, version).await.unwrap();

        // A second writer using the same snapshot must conflict.
        let err = save_session(&db, &state, version).await.unwrap_err();
        assert!(matches!(err, PlantaoError::Conflict { expected: 0, .. }));
    }

    #[tokio::test]
    async fn insert_conflicts_when_row_already_exists() {
        let db = setup_db().await;
        let state = SessionState::new("s4");
        save_session(&db, &state, 0).await.unwrap();
        let err = save_session(&db, &state, 0).await.unwrap_err();
        assert!(matches!(err, PlantaoError::Conflict { .. }));
    }
}

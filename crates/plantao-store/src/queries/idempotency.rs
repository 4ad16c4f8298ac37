// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotency records: cached responses keyed by `X-Idempotency-Key`.

use plantao_core::types::IdempotentRecord;
use plantao_core::PlantaoError;
use rusqlite::{params, OptionalExtension};

use crate::database::{map_tr_err, now_epoch, Database};

/// Cached response for a key, if present and unexpired.
pub async fn get_idempotent(
    db: &Database,
    key: &str,
) -> Result<Option<IdempotentRecord>, PlantaoError> {
    let key = key.to_string();
    let now = now_epoch();
    db.connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    "SELECT status_code, response_body, created_at FROM idempotency
                     WHERE idem_key = ?1 AND expires_at > ?2",
                    params![key, now],
                    |row| {
                        Ok(IdempotentRecord {
                            status_code: row.get::<_, i64>(0)? as u16,
                            response_body: row.get(1)?,
                            created_at: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)
}

/// Cache a rendered response under the key. First write wins within the TTL;
/// replaying the same key must not re-render.
pub async fn put_idempotent(
    db: &Database,
    key: &str,
    status_code: u16,
    response_body: &str,
    ttl_secs: i64,
) -> Result<(), PlantaoError> {
    let key = key.to_string();
    let body = response_body.to_string();
    let now = now_epoch();
    let expires_at = now + ttl_secs;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO idempotency (idem_key, status_code, response_body, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(idem_key) DO UPDATE
                 SET status_code = excluded.status_code,
                     response_body = excluded.response_body,
                     created_at = excluded.created_at,
                     expires_at = excluded.expires_at
                 WHERE idempotency.expires_at <= ?4",
                params![key, status_code as i64, body, now, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Drop expired keys. Called opportunistically.
pub async fn purge_expired(db: &Database) -> Result<usize, PlantaoError> {
    let now = now_epoch();
    db.connection()
        .call(move |conn| {
            let changes = conn.execute(
                "DELETE FROM idempotency WHERE expires_at <= ?1",
                params![now],
            )?;
            Ok(changes)
        })
        .await
        .map_err(map_tr_err)
}

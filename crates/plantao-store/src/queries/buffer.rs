// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation buffer: append-only, temporally ordered per session.

use plantao_core::types::{BufferEntry, Direction};
use plantao_core::{BufferOrder, PlantaoError};
use rusqlite::params;

use crate::database::{map_tr_err, now_epoch, Database};

/// Append one entry. TTL is stamped at write time; expired rows are filtered
/// on read and purged opportunistically.
pub async fn append_buffer(
    db: &Database,
    session_id: &str,
    entry: &BufferEntry,
    ttl_secs: i64,
) -> Result<(), PlantaoError> {
    let session_id = session_id.to_string();
    let entry = entry.clone();
    let meta = match &entry.meta {
        Some(meta) => Some(serde_json::to_string(meta).map_err(PlantaoError::storage)?),
        None => None,
    };
    let expires_at = now_epoch() + ttl_secs;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO conversation_buffer
                 (session_id, created_at_epoch, message_id, direction, text, meta, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    entry.created_at_epoch,
                    entry.message_id,
                    entry.direction.to_string(),
                    entry.text,
                    meta,
                    expires_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Read entries ordered by `created_at_epoch`, skipping expired rows.
pub async fn read_buffer(
    db: &Database,
    session_id: &str,
    since_epoch: Option<i64>,
    limit: usize,
    order: BufferOrder,
) -> Result<Vec<BufferEntry>, PlantaoError> {
    let session_id = session_id.to_string();
    let since = since_epoch.unwrap_or(i64::MIN);
    let now = now_epoch();
    let descending = order == BufferOrder::Descending;
    db.connection()
        .call(move |conn| {
            let sql = if descending {
                "SELECT created_at_epoch, message_id, direction, text, meta
                 FROM conversation_buffer
                 WHERE session_id = ?1 AND created_at_epoch >= ?2 AND expires_at > ?3
                 ORDER BY created_at_epoch DESC LIMIT ?4"
            } else {
                "SELECT created_at_epoch, message_id, direction, text, meta
                 FROM conversation_buffer
                 WHERE session_id = ?1 AND created_at_epoch >= ?2 AND expires_at > ?3
                 ORDER BY created_at_epoch ASC LIMIT ?4"
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(
                params![session_id, since, now, limit as i64],
                |row| {
                    let direction: String = row.get(2)?;
                    let meta: Option<String> = row.get(4)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        direction,
                        row.get::<_, String>(3)?,
                        meta,
                    ))
                },
            )?;
            let mut entries = Vec::new();
            for row in rows {
                entries.push(row?);
            }
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)?
        .into_iter()
        .map(|(created_at_epoch, message_id, direction, text, meta)| {
            let direction = direction
                .parse::<Direction>()
                .map_err(PlantaoError::storage)?;
            let meta = match meta {
                Some(raw) => Some(serde_json::from_str(&raw).map_err(PlantaoError::storage)?),
                None => None,
            };
            Ok(BufferEntry {
                created_at_epoch,
                direction,
                text,
                message_id,
                meta,
            })
        })
        .collect()
}

/// Drop expired rows. Called opportunistically, never on the hot path.
pub async fn purge_expired(db: &Database) -> Result<usize, PlantaoError> {
    let now = now_epoch();
    db.connection()
        .call(move |conn| {
            let changes = conn.execute(
                "DELETE FROM conversation_buffer WHERE expires_at <= ?1",
                params![now],
            )?;
            Ok(changes)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(epoch: i64, message_id: &str, direction: Direction, text: &str) -> BufferEntry {
        BufferEntry {
            created_at_epoch: epoch,
            direction,
            text: text.to_string(),
            message_id: message_id.to_string(),
            meta: None,
        }
    }

    #[tokio::test]
    async fn entries_come_back_in_epoch_order() {
        let db = Database::open_in_memory().await.unwrap();
        append_buffer(&db, "s1", &entry(300, "m3", Direction::Out, "terceira"), 3600)
            .await
            .unwrap();
        append_buffer(&db, "s1", &entry(100, "m1", Direction::In, "primeira"), 3600)
            .await
            .unwrap();
        append_buffer(&db, "s1", &entry(200, "m2", Direction::Out, "segunda"), 3600)
            .await
            .unwrap();

        let entries = read_buffer(&db, "s1", None, 10, BufferOrder::Ascending)
            .await
            .unwrap();
        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["primeira", "segunda", "terceira"]);

        let entries = read_buffer(&db, "s1", None, 10, BufferOrder::Descending)
            .await
            .unwrap();
        assert_eq!(entries[0].text, "terceira");
    }

    #[tokio::test]
    async fn since_filter_and_limit() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..5 {
            append_buffer(
                &db,
                "s1",
                &entry(i * 100, &format!("m{i}"), Direction::In, "oi"),
                3600,
            )
            .await
            .unwrap();
        }
        let entries = read_buffer(&db, "s1", Some(200), 2, BufferOrder::Ascending)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].created_at_epoch, 200);
    }

    #[tokio::test]
    async fn expired_entries_are_invisible_and_purgeable() {
        let db = Database::open_in_memory().await.unwrap();
        append_buffer(&db, "s1", &entry(1, "m1", Direction::In, "velha"), -10)
            .await
            .unwrap();
        append_buffer(&db, "s1", &entry(2, "m2", Direction::In, "viva"), 3600)
            .await
            .unwrap();

        let entries = read_buffer(&db, "s1", None, 10, BufferOrder::Ascending)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "viva");

        let purged = purge_expired(&db).await.unwrap();
        assert_eq!(purged, 1);
    }

    #[tokio::test]
    async fn meta_round_trips() {
        let db = Database::open_in_memory().await.unwrap();
        let mut e = entry(1, "m1", Direction::In, "oi");
        e.meta = Some(serde_json::json!({"outcomeCode": "help_generic"}));
        append_buffer(&db, "s1", &e, 3600).await.unwrap();

        let entries = read_buffer(&db, "s1", None, 1, BufferOrder::Ascending)
            .await
            .unwrap();
        assert_eq!(
            entries[0].meta.as_ref().unwrap()["outcomeCode"],
            "help_generic"
        );
    }
}

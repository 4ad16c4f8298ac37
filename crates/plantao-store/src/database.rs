// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use plantao_core::PlantaoError;
use tokio_rusqlite::Connection;

use crate::migrations;

/// Handle to the single SQLite connection. Query modules accept `&Database`
/// and call through `connection().call()`; tokio-rusqlite serializes all
/// closure calls on one background thread.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run
    /// embedded migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, PlantaoError> {
        let conn = Connection::open(path).await.map_err(map_tr_err)?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", 5_000)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// In-memory database for tests.
    pub async fn open_in_memory() -> Result<Self, PlantaoError> {
        let conn = Connection::open(":memory:").await.map_err(map_tr_err)?;
        conn.call(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub async fn close(self) -> Result<(), PlantaoError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite error into the shared storage error.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> PlantaoError {
    PlantaoError::Storage {
        source: Box::new(err),
    }
}

/// Current wall-clock, epoch seconds.
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Current wall-clock, epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current wall-clock as RFC 3339.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

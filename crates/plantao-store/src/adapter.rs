// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the `SessionStore` trait.

use async_trait::async_trait;

use plantao_config::model::{EngineConfig, StorageConfig};
use plantao_core::state::SessionState;
use plantao_core::types::{ActionStatus, BufferEntry, IdempotentRecord, PendingAction};
use plantao_core::{BufferOrder, PlantaoError, SessionStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store for the five logical tables.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. TTLs come from the engine configuration.
pub struct SqliteStore {
    db: Database,
    buffer_ttl_secs: i64,
    idempotency_ttl_secs: i64,
}

impl SqliteStore {
    /// Open the configured database and run migrations.
    pub async fn open(
        storage: &StorageConfig,
        engine: &EngineConfig,
    ) -> Result<Self, PlantaoError> {
        let db = Database::open(&storage.database_path, storage.wal_mode).await?;
        Ok(Self {
            db,
            buffer_ttl_secs: engine.buffer_ttl_secs,
            idempotency_ttl_secs: engine.idempotency_ttl_secs,
        })
    }

    /// In-memory store for tests.
    pub async fn open_in_memory() -> Result<Self, PlantaoError> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db,
            buffer_ttl_secs: 7 * 24 * 3600,
            idempotency_ttl_secs: 600,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn load_session(
        &self,
        session_id: &str,
    ) -> Result<(SessionState, i64), PlantaoError> {
        queries::sessions::load_session(&self.db, session_id).await
    }

    async fn save_session(
        &self,
        state: &SessionState,
        expected_version: i64,
    ) -> Result<i64, PlantaoError> {
        queries::sessions::save_session(&self.db, state, expected_version).await
    }

    async fn append_buffer(
        &self,
        session_id: &str,
        entry: &BufferEntry,
    ) -> Result<(), PlantaoError> {
        queries::buffer::append_buffer(&self.db, session_id, entry, self.buffer_ttl_secs).await
    }

    async fn read_buffer(
        &self,
        session_id: &str,
        since_epoch: Option<i64>,
        limit: usize,
        order: BufferOrder,
    ) -> Result<Vec<BufferEntry>, PlantaoError> {
        queries::buffer::read_buffer(&self.db, session_id, since_epoch, limit, order).await
    }

    async fn put_pending_action(
        &self,
        session_id: &str,
        action: &PendingAction,
    ) -> Result<(), PlantaoError> {
        queries::pending::put_pending_action(&self.db, session_id, action).await
    }

    async fn transition_pending_action(
        &self,
        session_id: &str,
        action_id: &str,
        from: ActionStatus,
        to: ActionStatus,
    ) -> Result<(), PlantaoError> {
        queries::pending::transition_pending_action(&self.db, session_id, action_id, from, to)
            .await
    }

    async fn acquire_lock(
        &self,
        resource: &str,
        owner: &str,
        lease_ms: i64,
    ) -> Result<bool, PlantaoError> {
        queries::locks::acquire_lock(&self.db, resource, owner, lease_ms).await
    }

    async fn release_lock(&self, resource: &str, owner: &str) -> Result<bool, PlantaoError> {
        queries::locks::release_lock(&self.db, resource, owner).await
    }

    async fn renew_lock(
        &self,
        resource: &str,
        owner: &str,
        lease_ms: i64,
    ) -> Result<bool, PlantaoError> {
        queries::locks::renew_lock(&self.db, resource, owner, lease_ms).await
    }

    async fn get_idempotent(
        &self,
        key: &str,
    ) -> Result<Option<IdempotentRecord>, PlantaoError> {
        queries::idempotency::get_idempotent(&self.db, key).await
    }

    async fn put_idempotent(
        &self,
        key: &str,
        status_code: u16,
        response_body: &str,
    ) -> Result<(), PlantaoError> {
        queries::idempotency::put_idempotent(
            &self.db,
            key,
            status_code,
            response_body,
            self.idempotency_ttl_secs,
        )
        .await
    }

    async fn ping(&self) -> Result<(), PlantaoError> {
        self.db
            .connection()
            .call(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantao_core::types::Direction;

    #[tokio::test]
    async fn adapter_exposes_all_five_stores() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        // Session OCC.
        let (state, version) = store.load_session("s1").await.unwrap();
        let v1 = store.save_session(&state, version).await.unwrap();
        assert_eq!(v1, 1);

        // Buffer.
        let entry = BufferEntry {
            created_at_epoch: 1,
            direction: Direction::In,
            text: "cheguei".into(),
            message_id: "m1".into(),
            meta: None,
        };
        store.append_buffer("s1", &entry).await.unwrap();
        let entries = store
            .read_buffer("s1", None, 10, BufferOrder::Ascending)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);

        // Lock.
        assert!(store.acquire_lock("session:s1", "w1", 10_000).await.unwrap());
        assert!(store.release_lock("session:s1", "w1").await.unwrap());

        // Idempotency.
        store.put_idempotent("k1", 200, "{}").await.unwrap();
        assert!(store.get_idempotent("k1").await.unwrap().is_some());

        store.ping().await.unwrap();
    }
}

// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence seam: the five logical stores behind one trait.
//!
//! Implementations MUST NOT require transactions spanning the stores; every
//! contract here is per-record. All mutation happens under the session lock,
//! which the engine acquires through the same trait.

use async_trait::async_trait;

use crate::error::PlantaoError;
use crate::state::SessionState;
use crate::types::{ActionStatus, BufferEntry, IdempotentRecord, PendingAction};

/// Read order for the conversation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOrder {
    Ascending,
    Descending,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session state and its version. Missing sessions yield a default
    /// state with version 0 — never `NotFound`.
    async fn load_session(
        &self,
        session_id: &str,
    ) -> Result<(SessionState, i64), PlantaoError>;

    /// Conditional write: succeeds only while the stored version equals
    /// `expected_version`, then stores `expected_version + 1` and returns it.
    /// Fails with [`PlantaoError::Conflict`] otherwise.
    async fn save_session(
        &self,
        state: &SessionState,
        expected_version: i64,
    ) -> Result<i64, PlantaoError>;

    /// Append one entry; never reads history on the hot path.
    async fn append_buffer(
        &self,
        session_id: &str,
        entry: &BufferEntry,
    ) -> Result<(), PlantaoError>;

    /// Read entries ordered by `created_at_epoch`.
    async fn read_buffer(
        &self,
        session_id: &str,
        since_epoch: Option<i64>,
        limit: usize,
        order: BufferOrder,
    ) -> Result<Vec<BufferEntry>, PlantaoError>;

    /// Record (or replace) the audit copy of a pending action.
    async fn put_pending_action(
        &self,
        session_id: &str,
        action: &PendingAction,
    ) -> Result<(), PlantaoError>;

    /// State-machine-safe status update; fails with `Conflict` when the stored
    /// status is not `from` or the edge is illegal.
    async fn transition_pending_action(
        &self,
        session_id: &str,
        action_id: &str,
        from: ActionStatus,
        to: ActionStatus,
    ) -> Result<(), PlantaoError>;

    /// Try to take the lease on `resource`. Returns false when another live
    /// owner holds it.
    async fn acquire_lock(
        &self,
        resource: &str,
        owner: &str,
        lease_ms: i64,
    ) -> Result<bool, PlantaoError>;

    /// Release only when `owner` still holds the lease.
    async fn release_lock(&self, resource: &str, owner: &str) -> Result<bool, PlantaoError>;

    /// Extend a held lease; false when the lease was lost.
    async fn renew_lock(
        &self,
        resource: &str,
        owner: &str,
        lease_ms: i64,
    ) -> Result<bool, PlantaoError>;

    /// Cached response for an idempotency key, if present and unexpired.
    async fn get_idempotent(
        &self,
        key: &str,
    ) -> Result<Option<IdempotentRecord>, PlantaoError>;

    /// Cache a rendered response under the key, with the store's TTL.
    async fn put_idempotent(
        &self,
        key: &str,
        status_code: u16,
        response_body: &str,
    ) -> Result<(), PlantaoError>;

    /// Cheap round-trip used by the readiness probe.
    async fn ping(&self) -> Result<(), PlantaoError>;
}

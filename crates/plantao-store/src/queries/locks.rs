// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session lease locks via conditional upsert.
//!
//! A lock row is `(resource, owner, lease_until)`. Acquisition succeeds when
//! the row is absent, expired, or already ours (re-entrant renewal).

use plantao_core::PlantaoError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Try to take the lease. Returns false while another live owner holds it.
pub async fn acquire_lock(
    db: &Database,
    resource: &str,
    owner: &str,
    lease_ms: i64,
) -> Result<bool, PlantaoError> {
    let resource = resource.to_string();
    let owner = owner.to_string();
    let now = now_ms();
    let lease_until = now + lease_ms;
    db.connection()
        .call(move |conn| {
            let changes = conn.execute(
                "INSERT INTO locks (resource, owner, lease_until) VALUES (?1, ?2, ?3)
                 ON CONFLICT(resource) DO UPDATE
                 SET owner = excluded.owner, lease_until = excluded.lease_until
                 WHERE locks.lease_until <= ?4 OR locks.owner = excluded.owner",
                params![resource, owner, lease_until, now],
            )?;
            Ok(changes == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Release only when `owner` still holds the lease.
pub async fn release_lock(
    db: &Database,
    resource: &str,
    owner: &str,
) -> Result<bool, PlantaoError> {
    let resource = resource.to_string();
    let owner = owner.to_string();
    db.connection()
        .call(move |conn| {
            let changes = conn.execute(
                "DELETE FROM locks WHERE resource = ?1 AND owner = ?2",
                params![resource, owner],
            )?;
            Ok(changes == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Extend a held lease. Returns false when the lease was lost in the meantime.
pub async fn renew_lock(
    db: &Database,
    resource: &str,
    owner: &str,
    lease_ms: i64,
) -> Result<bool, PlantaoError> {
    let resource = resource.to_string();
    let owner = owner.to_string();
    let lease_until = now_ms() + lease_ms;
    db.connection()
        .call(move |conn| {
            let changes = conn.execute(
                "UPDATE locks SET lease_until = ?3
                 WHERE resource = ?1 AND owner = ?2",
                params![resource, owner, lease_until],
            )?;
            Ok(changes == 1)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_owner_is_denied_while_lease_is_live() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(acquire_lock(&db, "session:s1", "w1", 10_000).await.unwrap());
        assert!(!acquire_lock(&db, "session:s1", "w2", 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn expired_lease_can_be_stolen() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(acquire_lock(&db, "session:s1", "w1", -1).await.unwrap());
        assert!(acquire_lock(&db, "session:s1", "w2", 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn acquisition_is_reentrant_for_the_same_owner() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(acquire_lock(&db, "session:s1", "w1", 10_000).await.unwrap());
        assert!(acquire_lock(&db, "session:s1", "w1", 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn release_requires_ownership() {
        let db = Database::open_in_memory().await.unwrap();
        acquire_lock(&db, "session:s1", "w1", 10_000).await.unwrap();
        assert!(!release_lock(&db, "session:s1", "w2").await.unwrap());
        assert!(release_lock(&db, "session:s1", "w1").await.unwrap());
        // Released: anyone may take it now.
        assert!(acquire_lock(&db, "session:s1", "w2", 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn renew_extends_only_a_held_lease() {
        let db = Database::open_in_memory().await.unwrap();
        acquire_lock(&db, "session:s1", "w1", 10_000).await.unwrap();
        assert!(renew_lock(&db, "session:s1", "w1", 20_000).await.unwrap());
        assert!(!renew_lock(&db, "session:s1", "w2", 20_000).await.unwrap());
    }
}

//! Repository for the `mission_keys` table.

use sqlx::PgPool;
use spirit_core::mission_key::generate_key;
use spirit_core::types::DbId;

use crate::errors::{is_unique_violation, UQ_MISSION_KEY};
use crate::models::mission_key::MissionKey;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, mission_id, key, one_use, times_used, created_at";

/// Provides minting and lookup for mission keys.
pub struct MissionKeyRepo;

impl MissionKeyRepo {
    /// Insert a key with an explicit value.
    pub async fn create(
        pool: &PgPool,
        mission_id: DbId,
        key: &str,
        one_use: bool,
    ) -> Result<MissionKey, sqlx::Error> {
        let query = format!(
            "INSERT INTO mission_keys (mission_id, key, one_use)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MissionKey>(&query)
            .bind(mission_id)
            .bind(key)
            .bind(one_use)
            .fetch_one(pool)
            .await
    }

    /// Mint a key with a freshly generated value.
    ///
    /// A collision with an existing key is retried with a new value, up to
    /// `max_attempts` inserts in total.
    pub async fn mint(
        pool: &PgPool,
        mission_id: DbId,
        one_use: bool,
        max_attempts: u32,
    ) -> Result<MissionKey, sqlx::Error> {
        let mut attempt = 1;
        loop {
            let key = generate_key();
            match Self::create(pool, mission_id, &key, one_use).await {
                Err(err) if is_unique_violation(&err, UQ_MISSION_KEY) && attempt < max_attempts => {
                    tracing::warn!(mission_id, attempt, "Mission key collision, regenerating");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Find a key by its exact string.
    pub async fn find_by_key(pool: &PgPool, key: &str) -> Result<Option<MissionKey>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mission_keys WHERE key = $1");
        sqlx::query_as::<_, MissionKey>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// List all keys of a mission, oldest first.
    pub async fn list_by_mission(
        pool: &PgPool,
        mission_id: DbId,
    ) -> Result<Vec<MissionKey>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM mission_keys WHERE mission_id = $1 ORDER BY id");
        sqlx::query_as::<_, MissionKey>(&query)
            .bind(mission_id)
            .fetch_all(pool)
            .await
    }
}

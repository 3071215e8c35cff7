//! Read access to the `completed_missions` table.
//!
//! Inserts happen only inside [`RedemptionRepo::redeem`](super::RedemptionRepo::redeem).

use sqlx::PgPool;
use spirit_core::types::DbId;

use crate::models::completed_mission::CompletedMission;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, mission_id, account_id, completed_at";

pub struct CompletedMissionRepo;

impl CompletedMissionRepo {
    /// Whether `account_id` has completed `mission_id`.
    pub async fn exists(
        pool: &PgPool,
        mission_id: DbId,
        account_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM completed_missions WHERE mission_id = $1 AND account_id = $2
             )",
        )
        .bind(mission_id)
        .bind(account_id)
        .fetch_one(pool)
        .await
    }

    /// All completions of an account, newest first.
    pub async fn list_by_account(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<Vec<CompletedMission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM completed_missions
             WHERE account_id = $1
             ORDER BY completed_at DESC, id DESC"
        );
        sqlx::query_as::<_, CompletedMission>(&query)
            .bind(account_id)
            .fetch_all(pool)
            .await
    }

    /// Number of accounts that completed a mission.
    pub async fn count_by_mission(pool: &PgPool, mission_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM completed_missions WHERE mission_id = $1")
            .bind(mission_id)
            .fetch_one(pool)
            .await
    }
}

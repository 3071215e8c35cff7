//! Repository for the `missions` table.

use sqlx::PgPool;
use spirit_core::types::DbId;

use crate::models::mission::{CreateMission, Mission, MissionWithCompletion};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, location, value, xp_points, \
                       start_time, end_time, created_at, updated_at";

/// Provides administrative operations and listings for missions.
pub struct MissionRepo;

impl MissionRepo {
    /// Insert a new mission, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMission) -> Result<Mission, sqlx::Error> {
        let query = format!(
            "INSERT INTO missions
                (title, description, location, value, xp_points, start_time, end_time)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Mission>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.value)
            .bind(input.xp_points)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_one(pool)
            .await
    }

    /// Find a mission by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Mission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM missions WHERE id = $1");
        sqlx::query_as::<_, Mission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all missions ordered by start time.
    pub async fn list(pool: &PgPool) -> Result<Vec<Mission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM missions ORDER BY start_time, id");
        sqlx::query_as::<_, Mission>(&query).fetch_all(pool).await
    }

    /// List all missions with a flag telling whether `account_id` completed each.
    pub async fn list_for_account(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<Vec<MissionWithCompletion>, sqlx::Error> {
        sqlx::query_as::<_, MissionWithCompletion>(
            "SELECT m.id, m.title, m.description, m.location, m.value, m.xp_points,
                    m.start_time, m.end_time, m.created_at, m.updated_at,
                    EXISTS (
                        SELECT 1 FROM completed_missions cm
                        WHERE cm.mission_id = m.id AND cm.account_id = $1
                    ) AS completed
             FROM missions m
             ORDER BY m.start_time, m.id",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await
    }

    /// Delete a mission together with its keys and completion records.
    ///
    /// Balances already credited are not reversed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM missions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `cohorts` table.

use sqlx::PgPool;
use spirit_core::types::DbId;

use crate::models::cohort::{Cohort, CreateCohort};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, points, created_at, updated_at";

/// Provides administrative operations for cohorts.
///
/// Points are never written here; only the redemption transaction credits them.
pub struct CohortRepo;

impl CohortRepo {
    /// Insert a new cohort with zero points, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCohort) -> Result<Cohort, sqlx::Error> {
        let query = format!("INSERT INTO cohorts (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Cohort>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a cohort by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Cohort>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cohorts WHERE id = $1");
        sqlx::query_as::<_, Cohort>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all cohorts alphabetically.
    pub async fn list(pool: &PgPool) -> Result<Vec<Cohort>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cohorts ORDER BY name");
        sqlx::query_as::<_, Cohort>(&query).fetch_all(pool).await
    }

    /// Delete a cohort. Members keep their accounts with no cohort.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cohorts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

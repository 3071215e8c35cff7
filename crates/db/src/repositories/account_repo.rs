//! Repository for the `accounts` table.

use sqlx::PgPool;
use spirit_core::types::DbId;

use crate::models::account::{Account, CreateAccount};
use crate::models::leaderboard::AccountStanding;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, cohort_id, points, total_xp, health, health_max, \
                       created_at, updated_at";

/// Provides registration and lookup for accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Register a new account with zero points and XP.
    pub async fn create(pool: &PgPool, input: &CreateAccount) -> Result<Account, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (username, cohort_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(&input.username)
            .bind(input.cohort_id)
            .fetch_one(pool)
            .await
    }

    /// Find an account by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an account by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE username = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Move an account into a cohort, or out of any cohort with `None`.
    ///
    /// Points already earned stay with the previous cohort.
    pub async fn set_cohort(
        pool: &PgPool,
        id: DbId,
        cohort_id: Option<DbId>,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET cohort_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(cohort_id)
            .fetch_optional(pool)
            .await
    }

    /// Competition rank of an account by points: one more than the number of
    /// accounts with strictly more points.
    pub async fn rank(pool: &PgPool, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM accounts o WHERE o.points > a.points) + 1
             FROM accounts a
             WHERE a.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Balances, rank, and cohort rank of an account, read in one statement
    /// so every figure comes from the same snapshot.
    pub async fn standing(pool: &PgPool, id: DbId) -> Result<Option<AccountStanding>, sqlx::Error> {
        sqlx::query_as::<_, AccountStanding>(
            "SELECT a.id, a.username, a.points, a.total_xp, a.health, a.health_max,
                    (SELECT COUNT(*) FROM accounts o WHERE o.points > a.points) + 1 AS rank,
                    a.cohort_id,
                    c.name AS cohort_name,
                    c.points AS cohort_points,
                    CASE WHEN c.id IS NULL THEN NULL
                         ELSE (SELECT COUNT(*) FROM cohorts oc WHERE oc.points > c.points) + 1
                    END AS cohort_rank
             FROM accounts a
             LEFT JOIN cohorts c ON c.id = a.cohort_id
             WHERE a.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

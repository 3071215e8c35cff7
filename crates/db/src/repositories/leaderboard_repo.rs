//! Leaderboard queries over accounts and cohorts.

use sqlx::PgPool;

use crate::models::leaderboard::{AccountLeaderboardEntry, CohortLeaderboardEntry};

/// Ranks use `RANK()`, so tied totals share a rank and the next is skipped.
pub struct LeaderboardRepo;

impl LeaderboardRepo {
    /// Top `limit` accounts by points.
    pub async fn top_accounts(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<AccountLeaderboardEntry>, sqlx::Error> {
        sqlx::query_as::<_, AccountLeaderboardEntry>(
            "SELECT RANK() OVER (ORDER BY a.points DESC) AS rank,
                    a.id, a.username, a.points, a.total_xp,
                    c.name AS cohort_name
             FROM accounts a
             LEFT JOIN cohorts c ON c.id = a.cohort_id
             ORDER BY a.points DESC, a.id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Top `limit` cohorts by points.
    pub async fn top_cohorts(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<CohortLeaderboardEntry>, sqlx::Error> {
        sqlx::query_as::<_, CohortLeaderboardEntry>(
            "SELECT RANK() OVER (ORDER BY c.points DESC) AS rank,
                    c.id, c.name, c.points,
                    (SELECT COUNT(*) FROM accounts a WHERE a.cohort_id = c.id) AS member_count
             FROM cohorts c
             ORDER BY c.points DESC, c.id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

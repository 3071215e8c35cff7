//! Read models for rankings and progression.

use serde::Serialize;
use spirit_core::types::DbId;
use sqlx::FromRow;

/// An account's balances together with its rank and its cohort's rank,
/// read in a single statement.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccountStanding {
    pub id: DbId,
    pub username: String,
    pub points: i64,
    pub total_xp: i64,
    pub health: i32,
    pub health_max: i32,
    pub rank: i64,
    pub cohort_id: Option<DbId>,
    pub cohort_name: Option<String>,
    pub cohort_points: Option<i64>,
    pub cohort_rank: Option<i64>,
}

/// One row of the account leaderboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccountLeaderboardEntry {
    pub rank: i64,
    pub id: DbId,
    pub username: String,
    pub points: i64,
    pub total_xp: i64,
    pub cohort_name: Option<String>,
}

/// One row of the cohort leaderboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CohortLeaderboardEntry {
    pub rank: i64,
    pub id: DbId,
    pub name: String,
    pub points: i64,
    pub member_count: i64,
}

//! The transactional store the engine depends on.

use async_trait::async_trait;
use serde::Serialize;
use spirit_core::eligibility::MissionWindow;
use spirit_core::mission_key::ClaimKey;
use spirit_core::ranking::Ranked;
use spirit_core::redemption::CompletedMissionView;
use spirit_core::types::{DbId, Timestamp};

use crate::error::EngineResult;

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// A cohort's total and rank among all cohorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortStanding {
    pub cohort_id: DbId,
    pub name: String,
    pub points: i64,
    pub rank: u32,
}

/// An account's balances and rank, read from one consistent snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingSnapshot {
    pub account_id: DbId,
    pub username: String,
    pub points: i64,
    pub total_xp: i64,
    pub health: i64,
    pub health_max: i64,
    pub rank: u32,
    pub cohort: Option<CohortStanding>,
}

/// Account leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountEntry {
    pub account_id: DbId,
    pub username: String,
    pub points: i64,
    pub total_xp: i64,
    pub cohort_name: Option<String>,
}

/// Cohort leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortEntry {
    pub cohort_id: DbId,
    pub name: String,
    pub points: i64,
    pub member_count: i64,
}

/// A mission as seen by one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionListing {
    pub mission_id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub value: i64,
    pub xp_points: i64,
    pub window: MissionWindow,
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Persistence for the mission engine.
///
/// [`MissionStore::redeem`] must run the ordered checks of
/// [`spirit_core::redemption::evaluate`] and apply the credit as one atomic
/// unit: on any error no balance, completion, or key counter changes.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// Redeem an already format-checked key for an account at `now`.
    ///
    /// Refusals come back as [`EngineError::Rejected`](crate::EngineError::Rejected);
    /// an unknown account is [`CoreError::NotFound`](spirit_core::error::CoreError::NotFound).
    async fn redeem(
        &self,
        key: &ClaimKey,
        account_id: DbId,
        now: Timestamp,
    ) -> EngineResult<CompletedMissionView>;

    /// Balances, rank, and cohort standing of an account.
    async fn standing(&self, account_id: DbId) -> EngineResult<StandingSnapshot>;

    /// Top `limit` accounts by points, ranked.
    async fn top_accounts(&self, limit: u32) -> EngineResult<Vec<Ranked<AccountEntry>>>;

    /// Top `limit` cohorts by points, ranked.
    async fn top_cohorts(&self, limit: u32) -> EngineResult<Vec<Ranked<CohortEntry>>>;

    /// Every mission with whether `account_id` completed it, by start time.
    async fn missions_for_account(&self, account_id: DbId) -> EngineResult<Vec<MissionListing>>;
}

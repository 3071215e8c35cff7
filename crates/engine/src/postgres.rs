//! PostgreSQL-backed [`MissionStore`].

use async_trait::async_trait;
use spirit_core::error::CoreError;
use spirit_core::mission_key::ClaimKey;
use spirit_core::ranking::Ranked;
use spirit_core::redemption::CompletedMissionView;
use spirit_core::types::{DbId, Timestamp};
use spirit_db::models::leaderboard::AccountStanding;
use spirit_db::repositories::{
    AccountRepo, LeaderboardRepo, MissionRepo, RedemptionOutcome, RedemptionRepo,
};
use spirit_db::DbPool;

use crate::error::{EngineError, EngineResult};
use crate::store::{
    AccountEntry, CohortEntry, CohortStanding, MissionListing, MissionStore, StandingSnapshot,
};

/// Store backed by the `spirit-db` repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn account_not_found(id: DbId) -> EngineError {
    EngineError::Core(CoreError::NotFound {
        entity: "account",
        id,
    })
}

/// Convert a database rank (`COUNT(*) + 1` or `RANK()`) to `u32`.
fn rank_from_db(rank: i64) -> Result<u32, CoreError> {
    u32::try_from(rank)
        .ok()
        .filter(|&rank| rank >= 1)
        .ok_or_else(|| CoreError::Internal(format!("rank {rank} out of range")))
}

impl TryFrom<AccountStanding> for StandingSnapshot {
    type Error = CoreError;

    fn try_from(row: AccountStanding) -> Result<Self, Self::Error> {
        let cohort = match (row.cohort_id, row.cohort_name, row.cohort_points, row.cohort_rank) {
            (Some(cohort_id), Some(name), Some(points), Some(rank)) => Some(CohortStanding {
                cohort_id,
                name,
                points,
                rank: rank_from_db(rank)?,
            }),
            _ => None,
        };
        Ok(StandingSnapshot {
            account_id: row.id,
            username: row.username,
            points: row.points,
            total_xp: row.total_xp,
            health: i64::from(row.health),
            health_max: i64::from(row.health_max),
            rank: rank_from_db(row.rank)?,
            cohort,
        })
    }
}

#[async_trait]
impl MissionStore for PgStore {
    async fn redeem(
        &self,
        key: &ClaimKey,
        account_id: DbId,
        now: Timestamp,
    ) -> EngineResult<CompletedMissionView> {
        match RedemptionRepo::redeem(&self.pool, key, account_id, now).await? {
            RedemptionOutcome::Completed(view) => Ok(view),
            RedemptionOutcome::Rejected(reason) => Err(EngineError::Rejected(reason)),
            RedemptionOutcome::AccountNotFound => Err(account_not_found(account_id)),
        }
    }

    async fn standing(&self, account_id: DbId) -> EngineResult<StandingSnapshot> {
        let row = AccountRepo::standing(&self.pool, account_id)
            .await?
            .ok_or_else(|| account_not_found(account_id))?;
        Ok(StandingSnapshot::try_from(row)?)
    }

    async fn top_accounts(&self, limit: u32) -> EngineResult<Vec<Ranked<AccountEntry>>> {
        let rows = LeaderboardRepo::top_accounts(&self.pool, i64::from(limit)).await?;
        let ranked = rows
            .into_iter()
            .map(|row| {
                Ok(Ranked {
                    rank: rank_from_db(row.rank)?,
                    entry: AccountEntry {
                        account_id: row.id,
                        username: row.username,
                        points: row.points,
                        total_xp: row.total_xp,
                        cohort_name: row.cohort_name,
                    },
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(ranked)
    }

    async fn top_cohorts(&self, limit: u32) -> EngineResult<Vec<Ranked<CohortEntry>>> {
        let rows = LeaderboardRepo::top_cohorts(&self.pool, i64::from(limit)).await?;
        let ranked = rows
            .into_iter()
            .map(|row| {
                Ok(Ranked {
                    rank: rank_from_db(row.rank)?,
                    entry: CohortEntry {
                        cohort_id: row.id,
                        name: row.name,
                        points: row.points,
                        member_count: row.member_count,
                    },
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        Ok(ranked)
    }

    async fn missions_for_account(&self, account_id: DbId) -> EngineResult<Vec<MissionListing>> {
        if AccountRepo::find_by_id(&self.pool, account_id).await?.is_none() {
            return Err(account_not_found(account_id));
        }
        let rows = MissionRepo::list_for_account(&self.pool, account_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| MissionListing {
                mission_id: row.mission.id,
                window: row.mission.window(),
                title: row.mission.title,
                description: row.mission.description,
                location: row.mission.location,
                value: row.mission.value,
                xp_points: row.mission.xp_points,
                completed: row.completed,
            })
            .collect())
    }
}

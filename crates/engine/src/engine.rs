use std::sync::Arc;

use serde::Serialize;
use spirit_core::clock::{Clock, SystemClock};
use spirit_core::eligibility::{is_claimable, MissionStatus};
use spirit_core::mission_key::ClaimKey;
use spirit_core::progression::{health_percent, Progression};
use spirit_core::ranking::Ranked;
use spirit_core::redemption::CompletedMissionView;
use spirit_core::types::DbId;

use crate::config::{EngineConfig, DEFAULT_LEADERBOARD_LIMIT};
use crate::error::{EngineError, EngineResult};
use crate::postgres::PgStore;
use crate::store::{AccountEntry, CohortEntry, CohortStanding, MissionListing, MissionStore};

/// Progression figures for one account, as shown on its dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionView {
    pub account_id: DbId,
    pub username: String,
    pub points: i64,
    pub total_xp: i64,
    pub level: u32,
    pub xp_toward_next_level: i64,
    pub xp_for_next_level: i64,
    pub xp_percent: u32,
    pub rank: u32,
    pub health_percent: u32,
    pub cohort: Option<CohortStanding>,
}

/// A mission with its status at the time of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionBoardEntry {
    #[serde(flatten)]
    pub mission: MissionListing,
    pub status: MissionStatus,
    /// Active and not yet completed by the account.
    pub claimable: bool,
}

/// Entry point for request handlers.
///
/// Cheap to clone; the store and clock are shared.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn MissionStore>,
    clock: Arc<dyn Clock>,
    leaderboard_limit: u32,
}

impl Engine {
    pub fn new(store: Arc<dyn MissionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }

    /// Override the leaderboard length used when callers pass no limit.
    pub fn with_leaderboard_limit(mut self, limit: u32) -> Self {
        self.leaderboard_limit = limit;
        self
    }

    /// Connect to PostgreSQL and build an engine on the system clock.
    pub async fn connect(config: &EngineConfig) -> EngineResult<Self> {
        let pool = spirit_db::create_pool(&config.database_url, config.max_connections).await?;
        tracing::info!(max_connections = config.max_connections, "Database connection pool created");
        Ok(Self::new(Arc::new(PgStore::new(pool)), Arc::new(SystemClock))
            .with_leaderboard_limit(config.leaderboard_limit))
    }

    /// Redeem a mission key for an account.
    ///
    /// The key is format-checked before any lookup. On success the account
    /// (and its cohort, if any) has been credited exactly once; on
    /// [`EngineError::Rejected`] nothing changed.
    #[tracing::instrument(skip(self, key))]
    pub async fn redeem(&self, key: &str, account_id: DbId) -> EngineResult<CompletedMissionView> {
        let key = ClaimKey::parse(key).inspect_err(|reason| {
            tracing::debug!(reason = reason.code(), "Malformed mission key");
        })?;
        let now = self.clock.now();

        match self.store.redeem(&key, account_id, now).await {
            Ok(view) => {
                tracing::info!(
                    mission_id = view.mission_id,
                    key_id = view.key_id,
                    points = view.points_awarded,
                    xp = view.xp_awarded,
                    "Redemption completed"
                );
                Ok(view)
            }
            Err(EngineError::Rejected(reason)) => {
                tracing::debug!(reason = reason.code(), "Redemption rejected");
                Err(EngineError::Rejected(reason))
            }
            Err(err) => {
                tracing::error!(error = %err, "Redemption failed");
                Err(err)
            }
        }
    }

    /// Level, XP progress, rank, and health of an account.
    #[tracing::instrument(skip(self))]
    pub async fn compute_progression(&self, account_id: DbId) -> EngineResult<ProgressionView> {
        let standing = self.store.standing(account_id).await?;
        let progression = Progression::from_total_xp(standing.total_xp)?;

        Ok(ProgressionView {
            account_id: standing.account_id,
            username: standing.username,
            points: standing.points,
            total_xp: standing.total_xp,
            level: progression.level,
            xp_toward_next_level: progression.xp_toward_next_level,
            xp_for_next_level: progression.xp_for_next_level,
            xp_percent: progression.xp_percent,
            rank: standing.rank,
            health_percent: health_percent(standing.health, standing.health_max)?,
            cohort: standing.cohort,
        })
    }

    /// Top accounts by points; `None` uses the configured default length.
    pub async fn account_leaderboard(
        &self,
        limit: Option<u32>,
    ) -> EngineResult<Vec<Ranked<AccountEntry>>> {
        self.store
            .top_accounts(limit.unwrap_or(self.leaderboard_limit))
            .await
    }

    /// Top cohorts by points; `None` uses the configured default length.
    pub async fn cohort_leaderboard(
        &self,
        limit: Option<u32>,
    ) -> EngineResult<Vec<Ranked<CohortEntry>>> {
        self.store
            .top_cohorts(limit.unwrap_or(self.leaderboard_limit))
            .await
    }

    /// Every mission with its current status and whether the account has
    /// completed it.
    pub async fn mission_board(&self, account_id: DbId) -> EngineResult<Vec<MissionBoardEntry>> {
        let now = self.clock.now();
        let listings = self.store.missions_for_account(account_id).await?;
        Ok(listings
            .into_iter()
            .map(|mission| MissionBoardEntry {
                status: mission.window.status(now),
                claimable: is_claimable(&mission.window, now, mission.completed),
                mission,
            })
            .collect())
    }
}

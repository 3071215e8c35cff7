//! In-process [`MissionStore`] holding all state behind one async mutex.
//!
//! Each redemption runs its checks and mutations under a single lock
//! acquisition, which gives the same all-or-nothing behaviour as the
//! PostgreSQL transaction.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use spirit_core::eligibility::{validate_window, MissionWindow};
use spirit_core::error::CoreError;
use spirit_core::mission_key::{generate_key, is_well_formed, ClaimKey};
use spirit_core::ranking::{competition_rank, rank_sorted, Ranked};
use spirit_core::redemption::{
    self, CompletedMissionView, KeySnapshot, MissionSnapshot, RedemptionError,
    RedemptionSnapshot, MAX_MISSION_REWARD,
};
use spirit_core::types::{DbId, Timestamp};
use spirit_db::models::account::DEFAULT_HEALTH;
use tokio::sync::Mutex;

use crate::config::DEFAULT_KEY_MINT_ATTEMPTS;
use crate::error::{EngineError, EngineResult};
use crate::store::{
    AccountEntry, CohortEntry, CohortStanding, MissionListing, MissionStore, StandingSnapshot,
};

/// A mission to add to a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct NewMission {
    pub title: String,
    pub description: String,
    pub location: String,
    pub value: i64,
    pub xp_points: i64,
    pub window: MissionWindow,
}

#[derive(Debug, Clone)]
struct CohortRow {
    name: String,
    points: i64,
}

#[derive(Debug, Clone)]
struct AccountRow {
    username: String,
    cohort_id: Option<DbId>,
    points: i64,
    total_xp: i64,
    health: i64,
    health_max: i64,
}

#[derive(Debug, Clone)]
struct KeyRow {
    id: DbId,
    mission_id: DbId,
    one_use: bool,
    times_used: i32,
}

#[derive(Debug, Clone, Copy)]
struct CompletionRow {
    id: DbId,
    completed_at: Timestamp,
}

#[derive(Debug, Default)]
struct State {
    next_id: DbId,
    cohorts: BTreeMap<DbId, CohortRow>,
    accounts: BTreeMap<DbId, AccountRow>,
    missions: BTreeMap<DbId, NewMission>,
    keys: HashMap<String, KeyRow>,
    /// Keyed by (mission_id, account_id): at most one completion per pair.
    completions: HashMap<(DbId, DbId), CompletionRow>,
}

impl State {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn snapshot(&self, key: &ClaimKey, account_id: DbId) -> Option<RedemptionSnapshot> {
        let key_row = self.keys.get(key.as_str())?;
        let mission = self.missions.get(&key_row.mission_id)?;
        let account = self.accounts.get(&account_id)?;
        Some(RedemptionSnapshot {
            key: KeySnapshot {
                key_id: key_row.id,
                one_use: key_row.one_use,
                times_used: key_row.times_used,
            },
            mission: MissionSnapshot {
                mission_id: key_row.mission_id,
                title: mission.title.clone(),
                location: mission.location.clone(),
                value: mission.value,
                xp_points: mission.xp_points,
                window: mission.window,
            },
            account_id,
            cohort_id: account.cohort_id,
            already_completed: self
                .completions
                .contains_key(&(key_row.mission_id, account_id)),
        })
    }

    fn cohort_standing(&self, cohort_id: DbId) -> Option<CohortStanding> {
        let cohort = self.cohorts.get(&cohort_id)?;
        Some(CohortStanding {
            cohort_id,
            name: cohort.name.clone(),
            points: cohort.points,
            rank: competition_rank(cohort.points, self.cohorts.values().map(|c| c.points)),
        })
    }
}

/// A [`MissionStore`] kept entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
    key_mint_attempts: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            key_mint_attempts: DEFAULT_KEY_MINT_ATTEMPTS,
        }
    }

    /// Override how many generated keys [`MemoryStore::mint_key`] tries.
    pub fn with_key_mint_attempts(mut self, attempts: u32) -> Self {
        self.key_mint_attempts = attempts;
        self
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Add a cohort with zero points.
    pub async fn add_cohort(&self, name: &str) -> DbId {
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        state.cohorts.insert(
            id,
            CohortRow {
                name: name.to_string(),
                points: 0,
            },
        );
        id
    }

    /// Delete a cohort; its members keep their accounts with no cohort.
    pub async fn delete_cohort(&self, cohort_id: DbId) -> bool {
        let mut state = self.state.lock().await;
        if state.cohorts.remove(&cohort_id).is_none() {
            return false;
        }
        for account in state.accounts.values_mut() {
            if account.cohort_id == Some(cohort_id) {
                account.cohort_id = None;
            }
        }
        true
    }

    /// Register an account with zero points and XP.
    pub async fn add_account(&self, username: &str, cohort_id: Option<DbId>) -> EngineResult<DbId> {
        let mut state = self.state.lock().await;
        if let Some(cohort_id) = cohort_id {
            if !state.cohorts.contains_key(&cohort_id) {
                return Err(CoreError::NotFound {
                    entity: "cohort",
                    id: cohort_id,
                }
                .into());
            }
        }
        if state.accounts.values().any(|a| a.username == username) {
            return Err(CoreError::Conflict(format!("username '{username}' is taken")).into());
        }
        let id = state.allocate_id();
        state.accounts.insert(
            id,
            AccountRow {
                username: username.to_string(),
                cohort_id,
                points: 0,
                total_xp: 0,
                health: i64::from(DEFAULT_HEALTH),
                health_max: i64::from(DEFAULT_HEALTH),
            },
        );
        Ok(id)
    }

    /// Add a mission after checking its window and rewards.
    pub async fn add_mission(&self, mission: NewMission) -> EngineResult<DbId> {
        validate_window(&mission.window).map_err(CoreError::Validation)?;
        let rewards = 0..=MAX_MISSION_REWARD;
        if !rewards.contains(&mission.value) || !rewards.contains(&mission.xp_points) {
            return Err(CoreError::Validation(format!(
                "mission rewards must be between 0 and {MAX_MISSION_REWARD}"
            ))
            .into());
        }
        let mut state = self.state.lock().await;
        let id = state.allocate_id();
        state.missions.insert(id, mission);
        Ok(id)
    }

    /// Add a key with an explicit value.
    pub async fn add_key(&self, mission_id: DbId, key: &str, one_use: bool) -> EngineResult<DbId> {
        let mut state = self.state.lock().await;
        insert_key(&mut state, mission_id, key, one_use)
    }

    /// Mint a key with a freshly generated value and return it.
    ///
    /// A collision is retried with a new value, up to the configured number
    /// of attempts in total.
    pub async fn mint_key(&self, mission_id: DbId, one_use: bool) -> EngineResult<String> {
        self.mint_key_with(mission_id, one_use, generate_key).await
    }

    async fn mint_key_with<F>(
        &self,
        mission_id: DbId,
        one_use: bool,
        mut next_key: F,
    ) -> EngineResult<String>
    where
        F: FnMut() -> String + Send,
    {
        let attempts = self.key_mint_attempts.max(1);
        let mut state = self.state.lock().await;
        for attempt in 1..=attempts {
            let key = next_key();
            if !state.keys.contains_key(&key) {
                insert_key(&mut state, mission_id, &key, one_use)?;
                return Ok(key);
            }
            tracing::warn!(mission_id, attempt, "Mission key collision, regenerating");
        }
        Err(CoreError::Conflict(format!("no unused mission key after {attempts} attempts")).into())
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// `(points, total_xp)` of an account.
    pub async fn account_balance(&self, account_id: DbId) -> Option<(i64, i64)> {
        let state = self.state.lock().await;
        state
            .accounts
            .get(&account_id)
            .map(|a| (a.points, a.total_xp))
    }

    pub async fn account_cohort(&self, account_id: DbId) -> Option<DbId> {
        let state = self.state.lock().await;
        state.accounts.get(&account_id).and_then(|a| a.cohort_id)
    }

    pub async fn cohort_points(&self, cohort_id: DbId) -> Option<i64> {
        let state = self.state.lock().await;
        state.cohorts.get(&cohort_id).map(|c| c.points)
    }

    pub async fn key_times_used(&self, key: &str) -> Option<i32> {
        let state = self.state.lock().await;
        state.keys.get(key).map(|k| k.times_used)
    }

    /// Number of completion records for a mission.
    pub async fn completion_count(&self, mission_id: DbId) -> usize {
        let state = self.state.lock().await;
        state
            .completions
            .keys()
            .filter(|(m, _)| *m == mission_id)
            .count()
    }

    /// Set an account's health, clamped to `0..=health_max`.
    pub async fn set_health(&self, account_id: DbId, health: i64) -> bool {
        let mut state = self.state.lock().await;
        match state.accounts.get_mut(&account_id) {
            Some(account) => {
                account.health = health.clamp(0, account.health_max);
                true
            }
            None => false,
        }
    }
}

fn insert_key(state: &mut State, mission_id: DbId, key: &str, one_use: bool) -> EngineResult<DbId> {
    if !is_well_formed(key) {
        return Err(CoreError::Validation(format!("'{key}' is not a 10-character alphanumeric key")).into());
    }
    if !state.missions.contains_key(&mission_id) {
        return Err(CoreError::NotFound {
            entity: "mission",
            id: mission_id,
        }
        .into());
    }
    if state.keys.contains_key(key) {
        return Err(CoreError::Conflict(format!("key '{key}' already exists")).into());
    }
    let id = state.allocate_id();
    state.keys.insert(
        key.to_string(),
        KeyRow {
            id,
            mission_id,
            one_use,
            times_used: 0,
        },
    );
    Ok(id)
}

fn account_not_found(id: DbId) -> EngineError {
    EngineError::Core(CoreError::NotFound {
        entity: "account",
        id,
    })
}

#[async_trait]
impl MissionStore for MemoryStore {
    async fn redeem(
        &self,
        key: &ClaimKey,
        account_id: DbId,
        now: Timestamp,
    ) -> EngineResult<CompletedMissionView> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&account_id) {
            return Err(account_not_found(account_id));
        }

        let snapshot = state.snapshot(key, account_id);
        let credit = redemption::evaluate(snapshot.as_ref(), now)?;
        let Some(snapshot) = snapshot else {
            return Err(RedemptionError::InvalidKey.into());
        };

        let pair = (credit.mission_id, credit.account_id);
        if state.completions.contains_key(&pair) {
            return Err(RedemptionError::ConcurrentConflict.into());
        }
        let completion = CompletionRow {
            id: state.allocate_id(),
            completed_at: now,
        };
        state.completions.insert(pair, completion);

        let (account_points, account_total_xp) = match state.accounts.get_mut(&credit.account_id) {
            Some(account) => {
                account.points += credit.points;
                account.total_xp += credit.xp;
                (account.points, account.total_xp)
            }
            None => return Err(account_not_found(account_id)),
        };
        if let Some(cohort) = credit.cohort_id.and_then(|id| state.cohorts.get_mut(&id)) {
            cohort.points += credit.points;
        }
        if let Some(key_row) = state.keys.get_mut(key.as_str()) {
            key_row.times_used += 1;
        }

        Ok(CompletedMissionView {
            completion_id: completion.id,
            mission_id: credit.mission_id,
            key_id: credit.key_id,
            title: snapshot.mission.title,
            location: snapshot.mission.location,
            points_awarded: credit.points,
            xp_awarded: credit.xp,
            account_id,
            account_points,
            account_total_xp,
            cohort_id: credit.cohort_id,
            completed_at: completion.completed_at,
        })
    }

    async fn standing(&self, account_id: DbId) -> EngineResult<StandingSnapshot> {
        let state = self.state.lock().await;
        let account = state
            .accounts
            .get(&account_id)
            .ok_or_else(|| account_not_found(account_id))?;
        Ok(StandingSnapshot {
            account_id,
            username: account.username.clone(),
            points: account.points,
            total_xp: account.total_xp,
            health: account.health,
            health_max: account.health_max,
            rank: competition_rank(account.points, state.accounts.values().map(|a| a.points)),
            cohort: account.cohort_id.and_then(|id| state.cohort_standing(id)),
        })
    }

    async fn top_accounts(&self, limit: u32) -> EngineResult<Vec<Ranked<AccountEntry>>> {
        let state = self.state.lock().await;
        let mut entries: Vec<AccountEntry> = state
            .accounts
            .iter()
            .map(|(&id, a)| AccountEntry {
                account_id: id,
                username: a.username.clone(),
                points: a.points,
                total_xp: a.total_xp,
                cohort_name: a
                    .cohort_id
                    .and_then(|c| state.cohorts.get(&c))
                    .map(|c| c.name.clone()),
            })
            .collect();
        entries.sort_by(|a, b| b.points.cmp(&a.points).then(a.account_id.cmp(&b.account_id)));
        entries.truncate(limit as usize);
        Ok(rank_sorted(entries, |e| e.points))
    }

    async fn top_cohorts(&self, limit: u32) -> EngineResult<Vec<Ranked<CohortEntry>>> {
        let state = self.state.lock().await;
        let mut entries: Vec<CohortEntry> = state
            .cohorts
            .iter()
            .map(|(&id, c)| CohortEntry {
                cohort_id: id,
                name: c.name.clone(),
                points: c.points,
                member_count: state
                    .accounts
                    .values()
                    .filter(|a| a.cohort_id == Some(id))
                    .count() as i64,
            })
            .collect();
        entries.sort_by(|a, b| b.points.cmp(&a.points).then(a.cohort_id.cmp(&b.cohort_id)));
        entries.truncate(limit as usize);
        Ok(rank_sorted(entries, |e| e.points))
    }

    async fn missions_for_account(&self, account_id: DbId) -> EngineResult<Vec<MissionListing>> {
        let state = self.state.lock().await;
        if !state.accounts.contains_key(&account_id) {
            return Err(account_not_found(account_id));
        }
        let mut listings: Vec<MissionListing> = state
            .missions
            .iter()
            .map(|(&id, m)| MissionListing {
                mission_id: id,
                title: m.title.clone(),
                description: m.description.clone(),
                location: m.location.clone(),
                value: m.value,
                xp_points: m.xp_points,
                window: m.window,
                completed: state.completions.contains_key(&(id, account_id)),
            })
            .collect();
        listings.sort_by(|a, b| {
            a.window
                .start_time
                .cmp(&b.window.start_time)
                .then(a.mission_id.cmp(&b.mission_id))
        });
        Ok(listings)
    }
}

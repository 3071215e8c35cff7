//! The redemption transaction.
//!
//! Reads the redemption snapshot, runs the ordered checks from
//! [`spirit_core::redemption::evaluate`], and applies the credit, all inside
//! one transaction. Any early return drops the transaction, which rolls back.

use sqlx::{FromRow, PgPool};
use spirit_core::eligibility::MissionWindow;
use spirit_core::mission_key::ClaimKey;
use spirit_core::redemption::{
    self, CompletedMissionView, KeySnapshot, MissionSnapshot, RedemptionError,
    RedemptionSnapshot,
};
use spirit_core::types::{DbId, Timestamp};

use crate::errors::{is_check_violation, is_unique_violation, CK_ONE_USE_KEY, UQ_COMPLETED_MISSION};
use crate::models::completed_mission::CompletedMission;

/// Result of one redemption attempt that reached the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// All mutations were committed.
    Completed(CompletedMissionView),
    /// A check failed; nothing was written.
    Rejected(RedemptionError),
    /// The account id does not exist; nothing was written.
    AccountNotFound,
}

/// Key row joined with its mission, locked for the duration of the transaction.
#[derive(Debug, FromRow)]
struct KeyMissionRow {
    key_id: DbId,
    one_use: bool,
    times_used: i32,
    mission_id: DbId,
    title: String,
    location: String,
    value: i64,
    xp_points: i64,
    start_time: Timestamp,
    end_time: Timestamp,
}

impl KeyMissionRow {
    fn into_snapshot(
        self,
        account_id: DbId,
        cohort_id: Option<DbId>,
        already_completed: bool,
    ) -> RedemptionSnapshot {
        RedemptionSnapshot {
            key: KeySnapshot {
                key_id: self.key_id,
                one_use: self.one_use,
                times_used: self.times_used,
            },
            mission: MissionSnapshot {
                mission_id: self.mission_id,
                title: self.title,
                location: self.location,
                value: self.value,
                xp_points: self.xp_points,
                window: MissionWindow::new(self.start_time, self.end_time),
            },
            account_id,
            cohort_id,
            already_completed,
        }
    }
}

pub struct RedemptionRepo;

impl RedemptionRepo {
    /// Redeem `key` for `account_id` at time `now`.
    ///
    /// The key row is locked `FOR UPDATE` so concurrent uses of the same key
    /// serialize on it. The completion insert uses the
    /// `(mission_id, account_id)` unique constraint: when a concurrent
    /// redemption of the same mission by the same account wins, the insert
    /// returns no row and the attempt is rejected as
    /// [`RedemptionError::ConcurrentConflict`].
    pub async fn redeem(
        pool: &PgPool,
        key: &ClaimKey,
        account_id: DbId,
        now: Timestamp,
    ) -> Result<RedemptionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let account: Option<(Option<DbId>,)> =
            sqlx::query_as("SELECT cohort_id FROM accounts WHERE id = $1")
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((cohort_id,)) = account else {
            return Ok(RedemptionOutcome::AccountNotFound);
        };

        let row = sqlx::query_as::<_, KeyMissionRow>(
            "SELECT mk.id AS key_id, mk.one_use, mk.times_used,
                    m.id AS mission_id, m.title, m.location, m.value, m.xp_points,
                    m.start_time, m.end_time
             FROM mission_keys mk
             JOIN missions m ON m.id = mk.mission_id
             WHERE mk.key = $1
             FOR UPDATE OF mk",
        )
        .bind(key.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let snapshot = match row {
            Some(row) => {
                let already_completed: bool = sqlx::query_scalar(
                    "SELECT EXISTS (
                        SELECT 1 FROM completed_missions
                        WHERE mission_id = $1 AND account_id = $2
                     )",
                )
                .bind(row.mission_id)
                .bind(account_id)
                .fetch_one(&mut *tx)
                .await?;
                Some(row.into_snapshot(account_id, cohort_id, already_completed))
            }
            None => None,
        };

        let credit = match redemption::evaluate(snapshot.as_ref(), now) {
            Ok(credit) => credit,
            Err(reason) => return Ok(RedemptionOutcome::Rejected(reason)),
        };
        // evaluate only succeeds on a resolved snapshot
        let Some(snapshot) = snapshot else {
            return Ok(RedemptionOutcome::Rejected(RedemptionError::InvalidKey));
        };

        let inserted = sqlx::query_as::<_, CompletedMission>(
            "INSERT INTO completed_missions (mission_id, account_id, completed_at)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_completed_missions_mission_account DO NOTHING
             RETURNING id, mission_id, account_id, completed_at",
        )
        .bind(credit.mission_id)
        .bind(credit.account_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await;
        let completion = match inserted {
            Ok(Some(completion)) => completion,
            Ok(None) => return Ok(RedemptionOutcome::Rejected(RedemptionError::ConcurrentConflict)),
            Err(err) if is_unique_violation(&err, UQ_COMPLETED_MISSION) => {
                return Ok(RedemptionOutcome::Rejected(RedemptionError::ConcurrentConflict));
            }
            Err(err) => return Err(err),
        };

        let (account_points, account_total_xp): (i64, i64) = sqlx::query_as(
            "UPDATE accounts
             SET points = points + $2, total_xp = total_xp + $3
             WHERE id = $1
             RETURNING points, total_xp",
        )
        .bind(credit.account_id)
        .bind(credit.points)
        .bind(credit.xp)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(cohort_id) = credit.cohort_id {
            sqlx::query("UPDATE cohorts SET points = points + $2 WHERE id = $1")
                .bind(cohort_id)
                .bind(credit.points)
                .execute(&mut *tx)
                .await?;
        }

        let used = sqlx::query("UPDATE mission_keys SET times_used = times_used + 1 WHERE id = $1")
            .bind(credit.key_id)
            .execute(&mut *tx)
            .await;
        match used {
            Ok(_) => {}
            Err(err) if is_check_violation(&err, CK_ONE_USE_KEY) => {
                return Ok(RedemptionOutcome::Rejected(RedemptionError::KeyExhausted));
            }
            Err(err) => return Err(err),
        }

        tx.commit().await?;

        Ok(RedemptionOutcome::Completed(CompletedMissionView {
            completion_id: completion.id,
            mission_id: completion.mission_id,
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
        }))
    }
}

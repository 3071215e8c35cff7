//! Redemption decision: the ordered checks that decide whether a key may be
//! claimed, and the credit a successful claim applies.
//!
//! A store loads a [`RedemptionSnapshot`] inside its transaction, calls
//! [`evaluate`], and applies the returned [`Credit`] in the same transaction.
//! The checks run in this order and stop at the first failure:
//!
//! 1. the key resolves to a stored mission key,
//! 2. the mission is active,
//! 3. the account has not completed the mission,
//! 4. a one-use key has not been used.

use serde::Serialize;

use crate::eligibility::{is_key_usable, MissionWindow};
use crate::types::{DbId, Timestamp};

/// Largest `value` or `xp_points` a single mission may award.
pub const MAX_MISSION_REWARD: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a redemption was refused. Every variant leaves balances unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionError {
    #[error("Invalid key")]
    InvalidKey,

    #[error("Mission is not active")]
    MissionNotActive,

    #[error("Mission already completed")]
    AlreadyCompleted,

    #[error("Key has already been used")]
    KeyExhausted,

    /// A concurrent redemption recorded the same completion first.
    #[error("Mission already completed (concurrent redemption)")]
    ConcurrentConflict,
}

impl RedemptionError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey => "INVALID_KEY",
            Self::MissionNotActive => "MISSION_NOT_ACTIVE",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::KeyExhausted => "KEY_EXHAUSTED",
            Self::ConcurrentConflict => "CONCURRENT_CONFLICT",
        }
    }

    /// Callers treat a lost race the same as an earlier completion.
    pub fn is_already_completed(&self) -> bool {
        matches!(self, Self::AlreadyCompleted | Self::ConcurrentConflict)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The stored mission key a claim resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySnapshot {
    pub key_id: DbId,
    pub one_use: bool,
    pub times_used: i32,
}

/// The mission a key points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionSnapshot {
    pub mission_id: DbId,
    pub title: String,
    pub location: String,
    pub value: i64,
    pub xp_points: i64,
    pub window: MissionWindow,
}

/// Everything the decision needs, read inside one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionSnapshot {
    pub key: KeySnapshot,
    pub mission: MissionSnapshot,
    pub account_id: DbId,
    pub cohort_id: Option<DbId>,
    pub already_completed: bool,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Balance changes for one successful redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub account_id: DbId,
    /// `None` when the account has no cohort; cohort crediting is skipped.
    pub cohort_id: Option<DbId>,
    pub mission_id: DbId,
    pub key_id: DbId,
    pub points: i64,
    pub xp: i64,
}

/// Run the ordered checks against a snapshot.
///
/// `resolved` is `None` when the key string matched no stored key.
pub fn evaluate(
    resolved: Option<&RedemptionSnapshot>,
    now: Timestamp,
) -> Result<Credit, RedemptionError> {
    let snapshot = resolved.ok_or(RedemptionError::InvalidKey)?;

    if !snapshot.mission.window.is_active(now) {
        return Err(RedemptionError::MissionNotActive);
    }
    if snapshot.already_completed {
        return Err(RedemptionError::AlreadyCompleted);
    }
    if !is_key_usable(snapshot.key.one_use, snapshot.key.times_used) {
        return Err(RedemptionError::KeyExhausted);
    }

    Ok(Credit {
        account_id: snapshot.account_id,
        cohort_id: snapshot.cohort_id,
        mission_id: snapshot.mission.mission_id,
        key_id: snapshot.key.key_id,
        points: snapshot.mission.value,
        xp: snapshot.mission.xp_points,
    })
}

// ---------------------------------------------------------------------------
// Result view
// ---------------------------------------------------------------------------

/// Confirmation of a successful redemption, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedMissionView {
    pub completion_id: DbId,
    pub mission_id: DbId,
    pub key_id: DbId,
    pub title: String,
    pub location: String,
    pub points_awarded: i64,
    pub xp_awarded: i64,
    pub account_id: DbId,
    /// Account balances after the credit was applied.
    pub account_points: i64,
    pub account_total_xp: i64,
    pub cohort_id: Option<DbId>,
    pub completed_at: Timestamp,
}

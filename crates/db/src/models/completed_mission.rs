//! Completion records: one per (mission, account).

use serde::Serialize;
use spirit_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `completed_missions` table.
///
/// Only the redemption transaction inserts these; they are never updated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CompletedMission {
    pub id: DbId,
    pub mission_id: DbId,
    pub account_id: DbId,
    pub completed_at: Timestamp,
}

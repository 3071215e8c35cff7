//! Mission key entity model and DTOs.

use serde::{Deserialize, Serialize};
use spirit_core::eligibility::is_key_usable;
use spirit_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// Upper bound on keys minted in one request.
pub const MAX_KEYS_PER_MINT: u32 = 500;

/// A row from the `mission_keys` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MissionKey {
    pub id: DbId,
    pub mission_id: DbId,
    pub key: String,
    pub one_use: bool,
    pub times_used: i32,
    pub created_at: Timestamp,
}

impl MissionKey {
    pub fn is_usable(&self) -> bool {
        is_key_usable(self.one_use, self.times_used)
    }
}

/// DTO for minting a batch of keys for one mission.
#[derive(Debug, Deserialize, Validate)]
pub struct MintMissionKeys {
    pub mission_id: DbId,
    pub one_use: bool,
    #[validate(range(min = 1, max = MAX_KEYS_PER_MINT))]
    pub count: u32,
}

//! Account entity model and DTOs.

use serde::{Deserialize, Serialize};
use spirit_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// Starting and maximum health for new accounts.
pub const DEFAULT_HEALTH: i32 = 100;

/// A row from the `accounts` table.
///
/// Identity and credentials belong to the external identity provider; this
/// row only carries what the mission engine reads and credits.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: DbId,
    pub username: String,
    pub cohort_id: Option<DbId>,
    pub points: i64,
    pub total_xp: i64,
    pub health: i32,
    pub health_max: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccount {
    #[validate(length(min = 1, max = 30))]
    pub username: String,
    pub cohort_id: Option<DbId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_limits() {
        let ok = CreateAccount {
            username: "ada".into(),
            cohort_id: None,
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateAccount {
            username: "a".repeat(31),
            cohort_id: Some(1),
        };
        assert!(too_long.validate().is_err());
    }
}

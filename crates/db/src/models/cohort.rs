//! Cohort (school grade) entity model and DTOs.

use serde::{Deserialize, Serialize};
use spirit_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `cohorts` table.
///
/// `points` is the running total of every redemption made by a member. It is
/// incremented at redemption time and never recomputed from completions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cohort {
    pub id: DbId,
    pub name: String,
    pub points: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new cohort.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCohort {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_length_limits() {
        assert!(CreateCohort { name: "9th grade".into() }.validate().is_ok());
        assert!(CreateCohort { name: String::new() }.validate().is_err());
        assert!(CreateCohort { name: "x".repeat(51) }.validate().is_err());
    }
}

//! Mission entity model and DTOs.

use serde::{Deserialize, Serialize};
use spirit_core::eligibility::{validate_window, MissionWindow};
use spirit_core::redemption::MAX_MISSION_REWARD;
use spirit_core::types::{DbId, Timestamp};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A row from the `missions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mission {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Points awarded to the account and its cohort on completion.
    pub value: i64,
    pub xp_points: i64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Mission {
    pub fn window(&self) -> MissionWindow {
        MissionWindow::new(self.start_time, self.end_time)
    }
}

/// A mission joined with whether a given account has completed it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MissionWithCompletion {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub mission: Mission,
    pub completed: bool,
}

/// DTO for creating a new mission.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateMission {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub description: String,
    #[validate(length(max = 50))]
    pub location: String,
    #[validate(range(min = 0, max = MAX_MISSION_REWARD))]
    pub value: i64,
    #[validate(range(min = 0, max = MAX_MISSION_REWARD))]
    pub xp_points: i64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

fn validate_create_window(input: &CreateMission) -> Result<(), ValidationError> {
    validate_window(&MissionWindow::new(input.start_time, input.end_time)).map_err(|msg| {
        let mut err = ValidationError::new("mission_window");
        err.message = Some(msg.into());
        err
    })
}

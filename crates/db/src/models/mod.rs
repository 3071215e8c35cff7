//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts

pub mod account;
pub mod cohort;
pub mod completed_mission;
pub mod leaderboard;
pub mod mission;
pub mod mission_key;

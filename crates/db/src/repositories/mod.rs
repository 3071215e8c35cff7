//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument.

pub mod account_repo;
pub mod cohort_repo;
pub mod completed_mission_repo;
pub mod leaderboard_repo;
pub mod mission_key_repo;
pub mod mission_repo;
pub mod redemption_repo;

pub use account_repo::AccountRepo;
pub use cohort_repo::CohortRepo;
pub use completed_mission_repo::CompletedMissionRepo;
pub use leaderboard_repo::LeaderboardRepo;
pub use mission_key_repo::MissionKeyRepo;
pub use mission_repo::MissionRepo;
pub use redemption_repo::{RedemptionOutcome, RedemptionRepo};

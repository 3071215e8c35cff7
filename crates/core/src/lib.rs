//! Domain logic for the mission-key redemption and progression engine.
//!
//! Everything in this crate is pure: no database, no clock reads except
//! through the [`clock::Clock`] trait. Persistence lives in `spirit-db`.

pub mod clock;
pub mod eligibility;
pub mod error;
pub mod mission_key;
pub mod progression;
pub mod ranking;
pub mod redemption;
pub mod types;

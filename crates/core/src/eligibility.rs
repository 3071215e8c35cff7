//! Mission activity windows and key usability.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Mission window
// ---------------------------------------------------------------------------

/// The inclusive time window during which a mission can be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionWindow {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

/// Where `now` falls relative to a mission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Upcoming,
    Active,
    Expired,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl MissionWindow {
    pub fn new(start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// The window has not opened yet.
    pub fn is_future(&self, now: Timestamp) -> bool {
        now < self.start_time
    }

    /// The window has closed.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.end_time
    }

    /// `start_time <= now <= end_time`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.is_future(now) && !self.is_expired(now)
    }

    pub fn status(&self, now: Timestamp) -> MissionStatus {
        if self.is_future(now) {
            MissionStatus::Upcoming
        } else if self.is_expired(now) {
            MissionStatus::Expired
        } else {
            MissionStatus::Active
        }
    }
}

/// Validate that a window does not end before it starts.
pub fn validate_window(window: &MissionWindow) -> Result<(), String> {
    if window.end_time < window.start_time {
        return Err(format!(
            "Mission end_time ({}) must not be before start_time ({})",
            window.end_time, window.start_time
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Keys and claims
// ---------------------------------------------------------------------------

/// A key can be used if it is reusable or has never been used.
pub fn is_key_usable(one_use: bool, times_used: i32) -> bool {
    !one_use || times_used == 0
}

/// A mission can be claimed by an account while active and not yet completed.
pub fn is_claimable(window: &MissionWindow, now: Timestamp, already_completed: bool) -> bool {
    window.is_active(now) && !already_completed
}

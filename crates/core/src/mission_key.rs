//! Mission key generation and claim-key validation.
//!
//! Keys are short human-typeable codes handed out at an event. They are
//! stored in plaintext: a key only unlocks credit for one mission.

use rand::Rng;
use serde::Serialize;

use crate::redemption::RedemptionError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of every mission key.
pub const KEY_LENGTH: usize = 10;

/// Number of distinct symbols a key character is drawn from (`a-z`, `A-Z`, `0-9`).
pub const KEY_ALPHABET_SIZE: usize = 62;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate a new random mission key.
pub fn generate_key() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `key` has the shape of a mission key: exactly [`KEY_LENGTH`]
/// ASCII letters and digits.
pub fn is_well_formed(key: &str) -> bool {
    key.len() == KEY_LENGTH && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// Claim key
// ---------------------------------------------------------------------------

/// A claim key that passed format validation and may be looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClaimKey(String);

impl ClaimKey {
    /// Validate a raw key submitted by a caller.
    ///
    /// Malformed input is rejected as [`RedemptionError::InvalidKey`] without
    /// touching the store.
    pub fn parse(raw: &str) -> Result<Self, RedemptionError> {
        if is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(RedemptionError::InvalidKey)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

use spirit_core::error::CoreError;
use spirit_core::redemption::RedemptionError;

/// Error type for engine entry points.
///
/// [`EngineError::Rejected`] is an expected outcome the caller presents to
/// the user. The other variants are infrastructure or domain failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A redemption was refused; no balance changed.
    #[error(transparent)]
    Rejected(#[from] RedemptionError),

    /// A domain-level error from `spirit_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for engine return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// The rejection reason, if this is a refused redemption.
    pub fn rejection(&self) -> Option<RedemptionError> {
        match self {
            EngineError::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.rejection().is_some()
    }
}

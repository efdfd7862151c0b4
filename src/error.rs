use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy for the rewards engine.
///
/// Callers embedding the engine map these onto their transport of choice;
/// `kind()` provides the stable machine-readable code for that mapping.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Stale tick {got} (last applied tick is {last_applied})")]
    StaleTick { last_applied: u64, got: u64 },

    #[error("Non-monotonic duration: reported {reported}s after {prior}s")]
    NonMonotonicDuration { prior: u64, reported: u64 },

    #[error("Insufficient balance: requested {requested}, available {balance}")]
    InsufficientBalance { balance: i64, requested: i64 },

    #[error("Unknown referral code: {0}")]
    UnknownReferralCode(String),

    #[error("User {0} already has a referral bonus applied")]
    AlreadyReferred(Uuid),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid payout method: {0}")]
    InvalidPayoutMethod(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Stable error code, independent of the display message.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::Forbidden(_) => "FORBIDDEN",
            EngineError::InvalidState(_) => "INVALID_STATE",
            EngineError::StaleTick { .. } => "STALE_TICK",
            EngineError::NonMonotonicDuration { .. } => "NON_MONOTONIC_DURATION",
            EngineError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            EngineError::UnknownReferralCode(_) => "UNKNOWN_REFERRAL_CODE",
            EngineError::AlreadyReferred(_) => "ALREADY_REFERRED",
            EngineError::InvalidAmount(_) => "INVALID_AMOUNT",
            EngineError::InvalidPayoutMethod(_) => "INVALID_PAYOUT_METHOD",
            EngineError::Config(_) => "CONFIG_ERROR",
        }
    }
}

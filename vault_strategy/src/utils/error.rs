use candid::CandidType;
use serde::Deserialize;

/// Strategy Result
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Strategy Errors
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub enum StrategyError {
    /// `initialize` was called on an instance that already completed setup
    AlreadyInitialized,
    /// The instance has not been initialized yet
    NotInitialized,
    /// The caller lacks the role required for the operation
    Unauthorized,
    /// The proposed venue does not accept `want` as collateral
    InvalidVenue,
    /// `sweep` was requested on a protected token. Carries the revert reason (`!want`, `!shares`).
    ProtectedToken(String),
    /// The venue cannot return enough of the requested amount
    InsufficientLiquidity {
        requested: String,
        available: String,
    },
    /// A state precondition does not hold (migration target, vault mismatch, zero address, ...)
    PreconditionFailed(String),
    /// The instance migrated away and only answers read-only calls
    Migrated,
    /// A token transfer exceeds the sender's balance
    InsufficientBalance,
    /// Decoding issue
    DecodingError(String),
    /// Arithmetic error
    Arithmetic(String),
}

pub fn arithmetic_err<S: AsRef<str>>(s: S) -> StrategyError {
    StrategyError::Arithmetic(format!("{:#?}", s.as_ref()))
}

pub fn precondition_err<S: AsRef<str>>(s: S) -> StrategyError {
    StrategyError::PreconditionFailed(s.as_ref().to_string())
}

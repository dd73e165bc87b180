use thiserror::Error;

/// Errors surfaced by the governance, registry, oracle and insurance entry points.
///
/// Every variant is returned synchronously to the caller of the operation that
/// detected it; a failed call leaves the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuretyError {
    #[error("Ledger is not operational")]
    NotOperational,

    #[error("Caller is not authorized: {0}")]
    Unauthorized(String),

    #[error("Airline {0} has not provided funding")]
    NotFunded(String),

    #[error("Airline {0} is not registered")]
    NotRegistered(String),

    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Duplicate flight: {0}")]
    Duplicate(String),

    #[error("Registration fee too low: paid {paid}, required {required}")]
    InsufficientFee { paid: u64, required: u64 },

    #[error("Premium too high: {premium} brings the policy to {total}, maximum {max}")]
    PremiumTooHigh { premium: u64, total: u64, max: u64 },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Unknown flight: {0}")]
    UnknownFlight(String),

    #[error("No open request for {0}")]
    NoSuchRequest(String),

    #[error("Already resolved: {0}")]
    Stale(String),

    #[error("No credit owed to {0}")]
    NothingOwed(String),

    #[error("Treasury cannot cover payout: owed {owed}, available {available}")]
    InsufficientFunds { owed: u64, available: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

impl SuretyError {
    /// Errors the coordinator expects when oracles race for the same tally.
    pub fn is_expected_race(&self) -> bool {
        matches!(self, SuretyError::Stale(_) | SuretyError::NoSuchRequest(_))
    }
}

pub type SuretyResult<T> = Result<T, SuretyError>;

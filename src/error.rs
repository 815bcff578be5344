use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to write statistics: {0}")]
    StatisticsError(#[from] csv::Error),

    #[error("Invalid scheduler configuration: {0}")]
    ConfigurationError(String),

    #[error("Unknown plugin selection: {0}")]
    ConversionError(#[from] ConversionError),

    /// A reservation or bookkeeping contract was broken. Never recovered internally.
    #[error("Scheduler invariant violated: {0}")]
    InvariantViolation(String),
}

impl Error {
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unknown strategy type '{0}'")]
    UnknownStrategyType(String),

    #[error("unknown sub-strategy type '{0}'")]
    UnknownSubStrategyType(String),

    #[error("unknown grouper type '{0}'")]
    UnknownGrouperType(String),

    #[error("unknown DSA strategy type '{0}'")]
    UnknownDsaStrategyType(String),

    #[error("unknown APC strategy type '{0}'")]
    UnknownApcStrategyType(String),

    #[error("unknown scheduling direction '{0}'")]
    UnknownDirection(String),

    #[error("unknown traffic model '{0}'")]
    UnknownTrafficModel(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns `Err(Error::InvariantViolation)` from the enclosing function when `cond` does not hold.
#[macro_export]
macro_rules! ensure_invariant {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            let message = format!($($arg)+);
            log::error!("Invariant violation: {}", message);
            return Err($crate::error::Error::InvariantViolation(message));
        }
    };
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KoboldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Comparison error: {0}")]
    Comparison(String),
}

pub type Result<T> = std::result::Result<T, KoboldError>;

/// Failure of a single decode step.
///
/// Never escapes a comparison: the comparator falls back to diffing the raw,
/// undecoded value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{decoder} decoder cannot read a {found} value")]
    UnexpectedInput {
        decoder: &'static str,
        found: String,
    },

    #[error("{decoder} decoder failed: {reason}")]
    Malformed {
        decoder: &'static str,
        reason: String,
    },
}

impl DecodeError {
    pub fn malformed(decoder: &'static str, reason: impl ToString) -> Self {
        DecodeError::Malformed {
            decoder,
            reason: reason.to_string(),
        }
    }
}

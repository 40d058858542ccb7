use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Invalid pattern: reference pattern must contain at least one byte")]
    InvalidPattern,

    #[error("Invalid pattern encoding: {0}")]
    InvalidPatternEncoding(String),
}

impl From<hex::FromHexError> for VerifyError {
    fn from(err: hex::FromHexError) -> Self {
        VerifyError::InvalidPatternEncoding(err.to_string())
    }
}

pub type VerifyResult<T> = Result<T, VerifyError>;

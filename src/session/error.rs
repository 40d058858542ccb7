use crate::session::types::SessionSummary;
use crate::transport::TransportError;
use crate::verify::VerifyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Verification setup failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Background writer panicked")]
    WriterPanicked,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session aborted after {} bytes: {source}", .summary.bytes_processed())]
    Aborted {
        summary: Box<SessionSummary>,
        #[source]
        source: Box<SessionError>,
    },
}

impl SessionError {
    /// Statistics gathered before the session was aborted
    pub fn summary(&self) -> Option<&SessionSummary> {
        match self {
            SessionError::Aborted { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// Whether the error was caught before any traffic was sent
    pub fn is_config_error(&self) -> bool {
        matches!(self, SessionError::InvalidConfig(_) | SessionError::Verify(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

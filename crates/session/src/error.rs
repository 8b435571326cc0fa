//! Session-level error type.

use enhancer_core_types::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {0}s")]
    NavigationTimeout(u64),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("element not found for selector `{0}`")]
    ElementNotFound(String),

    #[error("surface element {0} is no longer present")]
    StaleElement(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

impl From<SessionError> for EngineError {
    fn from(err: SessionError) -> Self {
        EngineError::Session(err.to_string())
    }
}

//! Session-level errors

use thiserror::Error;

use crate::ports::memory_store::MemoryError;
use crate::ports::model_client::ClientError;
use crate::ports::recorder::RecorderError;

/// Errors that abort a deliberation session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Model client error: {0}")]
    Client(#[from] ClientError),

    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("Memory store error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No model client registered for member '{0}'")]
    MissingClient(String),

    #[error("Session cancelled")]
    Cancelled,

    #[error("Task join error: {0}")]
    Join(String),
}

impl SessionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

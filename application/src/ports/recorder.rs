//! Session recorder port
//!
//! The append-only event log plus the session's artifact surface. Every
//! append must reach durable storage before the call returns, so that the
//! event stream is replayable after any crash that survives the last
//! successful write. Only the orchestrator sequencer calls this port;
//! fan-out workers never touch it.

use async_trait::async_trait;
use conclave_domain::{Event, SessionStateDoc};
use thiserror::Error;

/// Errors from the recorder; fatal to the session
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Append-only session recorder
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    /// Append one event and flush it durably.
    async fn append(&self, event: &Event) -> Result<(), RecorderError>;

    /// Write (or overwrite) a named artifact in the session directory.
    async fn write_artifact(&self, name: &str, contents: &str) -> Result<(), RecorderError>;

    /// Persist the final session state document.
    async fn finalize(&self, state: &SessionStateDoc) -> Result<(), RecorderError>;
}

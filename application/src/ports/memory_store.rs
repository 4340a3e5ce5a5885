//! Memory store port
//!
//! Persists the bounded structured memory of each member and of the council.
//! Reads happen on turn entry (the snapshot was pre-computed at the previous
//! session's close); the single write happens once, at session close.

use async_trait::async_trait;
use conclave_domain::{CouncilConfig, PromptContext, SessionMemoryInput};
use thiserror::Error;

/// Errors from the memory store; fatal to the session
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Durable per-member and council memory
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Ensure every member has a profile and an (empty if new) memory
    /// document. Called once before the first turn.
    async fn prepare(&self, config: &CouncilConfig) -> Result<(), MemoryError>;

    /// Read a member's prompt-context snapshot. `None` when the member has
    /// no usable memory yet.
    async fn member_context(&self, member_id: &str) -> Result<Option<PromptContext>, MemoryError>;

    /// Apply the session-close upserts, prune, and recompute snapshots.
    async fn record_session(&self, input: &SessionMemoryInput) -> Result<(), MemoryError>;
}

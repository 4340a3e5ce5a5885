//! Model client port
//!
//! Each council member is backed by an opaque request/response oracle with
//! two operations: free-text completion and JSON-mode completion. Transport
//! and provider failures are fatal [`ClientError`]s; a reply that arrived
//! but could not be decoded is NOT an error; it comes back as
//! [`JsonReply::ParseError`] so the normalizers can substitute the
//! deterministic fallback.
//!
//! The engine makes exactly one call per prompt. Retries, timeouts and rate
//! limiting are the adapter's business.

use async_trait::async_trait;
use conclave_domain::JsonReply;
use thiserror::Error;

/// Errors that are fatal to the session
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Per-call completion options
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Opaque request/response oracle for one member's model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Free-text completion.
    async fn complete_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ClientError>;

    /// JSON-mode completion. Decode failures are carried in the reply, not
    /// the error channel.
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<JsonReply, ClientError>;
}

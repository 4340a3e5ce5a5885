//! Deliberation session use cases
//!
//! The orchestrator is logically single-threaded on the sequencing axis:
//! every event is appended in a strict total order by the sequencer, and the
//! only parallelism is the three bounded fan-outs (leader election,
//! seconding, voting), each joined before any of its events is emitted.

mod documentation;
mod election;
mod error;
mod fan_out;
mod orchestrator;
mod phase_runner;
mod scribe;

pub use error::SessionError;
pub use orchestrator::{DeliberationSession, SessionDeps};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use conclave_domain::{Member, TranscriptEntry};

use crate::ports::model_client::{CompletionOptions, ModelClient};

/// Per-call options derived from a member's model reference.
pub(crate) fn options_for(member: &Member) -> CompletionOptions {
    CompletionOptions {
        temperature: member.model.temperature,
        max_tokens: member.model.max_tokens,
    }
}

/// Resolve the registered client for a member.
pub(crate) fn client_for<'a>(
    clients: &'a HashMap<String, Arc<dyn ModelClient>>,
    member_id: &str,
) -> Result<&'a Arc<dyn ModelClient>, SessionError> {
    clients
        .get(member_id)
        .ok_or_else(|| SessionError::MissingClient(member_id.to_string()))
}

/// Mutable session state owned exclusively by the sequencer.
///
/// Fan-out workers return values; they never touch this.
pub(crate) struct SessionState {
    pub transcript: Vec<TranscriptEntry>,
    /// Member id -> last MESSAGE_CONTRIBUTED text
    pub last_contributions: BTreeMap<String, String>,
    /// Members that hit the JSON parse-fallback path at least once
    pub parse_fallback_members: BTreeSet<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            last_contributions: BTreeMap::new(),
            parse_fallback_members: BTreeSet::new(),
        }
    }
}

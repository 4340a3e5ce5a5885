//! Session-level result types

use serde::{Deserialize, Serialize};

use crate::motion::Motion;
use crate::phase::transition::EndedBy;

/// One line of the running discussion, used for prompt context windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub phase_id: String,
    pub round: u32,
    /// Member id of the speaker
    pub speaker: String,
    pub text: String,
}

/// How one phase concluded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResult {
    pub phase_id: String,
    pub phase_goal: String,
    pub ended_by: EndedBy,
    /// The adopted decision, or the phase fallback text on round limit
    pub final_resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_motion: Option<Motion>,
    pub rounds_completed: u32,
}

/// The leader's closing statement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderSummary {
    pub summary_markdown: String,
    pub final_resolution: String,
    pub requires_execution: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_brief: Option<String>,
}

/// Descriptor handed to whatever executes the deliberated outcome.
///
/// The engine never executes anything itself; `approved` reflects the
/// human-approval gate at the time the session closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionHandoff {
    pub session_id: String,
    pub approved: bool,
    pub approval_required: bool,
    pub default_executor_profile: String,
    pub motion_id: Option<String>,
    pub leader_id: String,
    pub execution_brief: String,
}

/// Final session state document, persisted as `session.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateDoc {
    pub session_id: String,
    pub leader_id: String,
    pub human_prompt: String,
    pub phase_results: Vec<PhaseResult>,
    pub ended_by: EndedBy,
    pub final_resolution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_approved: Option<bool>,
    /// Artifact file names written under the session directory
    pub artifacts: Vec<String>,
}

/// Everything a caller gets back from a completed session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub session_id: String,
    pub leader_id: String,
    pub ended_by: EndedBy,
    pub final_resolution: String,
    pub phase_results: Vec<PhaseResult>,
    pub leader_summary: LeaderSummary,
    pub documentation_approved: Option<bool>,
    pub handoff: Option<ExecutionHandoff>,
}

//! Tagged protocol reply variants

use serde::{Deserialize, Serialize};

use crate::ballot::BallotChoice;

/// What a member chose to do with its turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnAction {
    /// Speak to the council
    Contribute { message: String },
    /// Yield the turn
    Pass {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// Put a motion on the floor
    #[serde(rename_all = "camelCase")]
    CallVote {
        title: String,
        text: String,
        decision_if_pass: String,
    },
}

impl TurnAction {
    /// Short tag for logging and event payloads
    pub fn kind(&self) -> &'static str {
        match self {
            TurnAction::Contribute { .. } => "CONTRIBUTE",
            TurnAction::Pass { .. } => "PASS",
            TurnAction::CallVote { .. } => "CALL_VOTE",
        }
    }
}

/// A member's answer to "will you second this motion?"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondingReply {
    pub second: bool,
    pub rationale: String,
}

/// A member's ballot on a motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteReply {
    pub ballot: BallotChoice,
    pub rationale: String,
}

/// A member's vote in the leader election
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionBallot {
    pub candidate_id: String,
    pub rationale: String,
}

//! Ordered protocol events
//!
//! Every observable step of a session is recorded as an [`Event`] in a
//! single, strictly ordered stream. Sequence numbers are monotonic within a
//! session and event order exactly matches the causal order of the state
//! machine. Payloads are opaque JSON; the `kind` field is the closed
//! taxonomy below.

use serde::{Deserialize, Serialize};

/// Sub-state of the per-turn state machine the event was emitted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseState {
    /// Round-robin contributions; also tags session-level events
    Discussion,
    /// A motion is on the floor awaiting a seconder
    Seconding,
    /// Blind ballot collection is in progress or just resolved
    Voting,
}

/// Closed event taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SessionStarted,
    LeaderElectionBallot,
    LeaderElected,
    PhaseStarted,
    RoundStarted,
    TurnAction,
    MessageContributed,
    PassRecorded,
    MotionCalled,
    SecondingResponse,
    MotionSeconded,
    MotionNotSeconded,
    VoteCast,
    VoteResult,
    RoundLimitReached,
    PhaseCompleted,
    PhaseTransition,
    LeaderSummaryRecorded,
    DocumentDraftWritten,
    DocumentRevisionWritten,
    DocumentApprovalVoteCalled,
    DocumentApprovalVoteResult,
    DocumentFeedbackCollected,
    SessionClosed,
}

impl EventKind {
    /// Wire/transcript name of this event kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SessionStarted => "SESSION_STARTED",
            EventKind::LeaderElectionBallot => "LEADER_ELECTION_BALLOT",
            EventKind::LeaderElected => "LEADER_ELECTED",
            EventKind::PhaseStarted => "PHASE_STARTED",
            EventKind::RoundStarted => "ROUND_STARTED",
            EventKind::TurnAction => "TURN_ACTION",
            EventKind::MessageContributed => "MESSAGE_CONTRIBUTED",
            EventKind::PassRecorded => "PASS_RECORDED",
            EventKind::MotionCalled => "MOTION_CALLED",
            EventKind::SecondingResponse => "SECONDING_RESPONSE",
            EventKind::MotionSeconded => "MOTION_SECONDED",
            EventKind::MotionNotSeconded => "MOTION_NOT_SECONDED",
            EventKind::VoteCast => "VOTE_CAST",
            EventKind::VoteResult => "VOTE_RESULT",
            EventKind::RoundLimitReached => "ROUND_LIMIT_REACHED",
            EventKind::PhaseCompleted => "PHASE_COMPLETED",
            EventKind::PhaseTransition => "PHASE_TRANSITION",
            EventKind::LeaderSummaryRecorded => "LEADER_SUMMARY_RECORDED",
            EventKind::DocumentDraftWritten => "DOCUMENT_DRAFT_WRITTEN",
            EventKind::DocumentRevisionWritten => "DOCUMENT_REVISION_WRITTEN",
            EventKind::DocumentApprovalVoteCalled => "DOCUMENT_APPROVAL_VOTE_CALLED",
            EventKind::DocumentApprovalVoteResult => "DOCUMENT_APPROVAL_VOTE_RESULT",
            EventKind::DocumentFeedbackCollected => "DOCUMENT_FEEDBACK_COLLECTED",
            EventKind::SessionClosed => "SESSION_CLOSED",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record in the session's ordered event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Monotonically increasing, 1-based sequence number
    pub seq: u64,
    pub session_id: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub phase_state: PhaseState,
    pub kind: EventKind,
    /// Round counter within the current phase; 0 outside any phase
    pub round: u32,
    /// Session-global turn counter; 0 before the first turn
    pub turn_index: u64,
    /// Member the event is attributed to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Event-specific data; shape depends on `kind`
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&EventKind::MotionNotSeconded).unwrap();
        assert_eq!(json, "\"MOTION_NOT_SECONDED\"");
        assert_eq!(EventKind::MotionNotSeconded.as_str(), "MOTION_NOT_SECONDED");
    }

    #[test]
    fn test_event_round_trips() {
        let event = Event {
            seq: 7,
            session_id: "s-1".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            phase_state: PhaseState::Voting,
            kind: EventKind::VoteCast,
            round: 2,
            turn_index: 11,
            actor_id: Some("alice".to_string()),
            payload: serde_json::json!({"ballot": "YES"}),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seq, 7);
        assert_eq!(back.kind, EventKind::VoteCast);
        assert_eq!(back.actor_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_absent_actor_is_omitted() {
        let event = Event {
            seq: 1,
            session_id: "s-1".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            phase_state: PhaseState::Discussion,
            kind: EventKind::SessionStarted,
            round: 0,
            turn_index: 0,
            actor_id: None,
            payload: serde_json::json!({}),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("actorId"));
        assert!(json.contains("\"turnIndex\":0"));
    }
}

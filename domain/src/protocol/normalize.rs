//! Response normalization with deterministic fallbacks
//!
//! Every normalizer maps an arbitrary [`JsonReply`] into exactly one legal
//! protocol variant. A reply that cannot be parsed or fails validation never
//! aborts the session; it becomes the canonical fallback for its step: a
//! PASS turn, a declined second, an ABSTAIN ballot, or a vote for the first
//! member in declaration order.

use serde_json::Value;

use super::action::{ElectionBallot, SecondingReply, TurnAction, VoteReply};
use super::limits;
use super::reply::JsonReply;
use crate::ballot::BallotChoice;
use crate::session::LeaderSummary;

/// Note attached to every auto-converted PASS
const AUTO_PASS_NOTE: &str = "Auto-converted to PASS to preserve deterministic flow.";

fn parse_error_reason(message: &str) -> String {
    limits::clip(&format!("Model JSON parse error: {message}"), limits::REASON_MAX)
}

fn invalid_format_reason(detail: &str) -> String {
    limits::clip(&format!("Invalid response format: {detail}"), limits::REASON_MAX)
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// Coerce a turn reply into a [`TurnAction`].
pub fn turn_action(reply: &JsonReply) -> TurnAction {
    let value = match reply {
        JsonReply::Value(value) => value,
        JsonReply::ParseError { message, .. } => {
            return TurnAction::Pass {
                reason: parse_error_reason(message),
                note: Some(AUTO_PASS_NOTE.to_string()),
            };
        }
    };

    let fallback = |detail: &str| TurnAction::Pass {
        reason: invalid_format_reason(detail),
        note: Some(AUTO_PASS_NOTE.to_string()),
    };

    match value.get("action").and_then(Value::as_str) {
        Some("CONTRIBUTE") => match str_field(value, "message") {
            Some(message) => TurnAction::Contribute {
                message: limits::clip(message, limits::MESSAGE_MAX),
            },
            None => fallback("CONTRIBUTE requires a non-empty 'message'"),
        },
        Some("PASS") => TurnAction::Pass {
            reason: limits::clip(
                str_field(value, "reason").unwrap_or("no reason given"),
                limits::REASON_MAX,
            ),
            note: str_field(value, "note").map(|n| limits::clip(n, limits::NOTE_MAX)),
        },
        Some("CALL_VOTE") => {
            let (Some(title), Some(text), Some(decision)) = (
                str_field(value, "title"),
                str_field(value, "text"),
                str_field(value, "decisionIfPass"),
            ) else {
                return fallback("CALL_VOTE requires 'title', 'text' and 'decisionIfPass'");
            };
            TurnAction::CallVote {
                title: limits::clip(title, limits::TITLE_MAX),
                text: limits::clip(text, limits::MOTION_TEXT_MAX),
                decision_if_pass: limits::clip(decision, limits::DECISION_MAX),
            }
        }
        Some(other) => fallback(&format!("unknown action '{other}'")),
        None => fallback("expected a JSON object with an 'action' field"),
    }
}

/// Coerce a seconding reply. Anything unparseable declines.
pub fn seconding(reply: &JsonReply) -> SecondingReply {
    let value = match reply {
        JsonReply::Value(value) => value,
        JsonReply::ParseError { message, .. } => {
            return SecondingReply {
                second: false,
                rationale: parse_error_reason(message),
            };
        }
    };

    match value.get("second").and_then(Value::as_bool) {
        Some(second) => SecondingReply {
            second,
            rationale: limits::clip(
                str_field(value, "rationale").unwrap_or("no rationale given"),
                limits::RATIONALE_MAX,
            ),
        },
        None => SecondingReply {
            second: false,
            rationale: invalid_format_reason("expected a boolean 'second' field"),
        },
    }
}

/// Coerce a vote reply. Anything unparseable abstains (which counts as NO
/// under abstain-as-no governance).
pub fn vote(reply: &JsonReply) -> VoteReply {
    let value = match reply {
        JsonReply::Value(value) => value,
        JsonReply::ParseError { message, .. } => {
            return VoteReply {
                ballot: BallotChoice::Abstain,
                rationale: parse_error_reason(message),
            };
        }
    };

    let ballot = match value.get("ballot").and_then(Value::as_str) {
        Some("YES") => BallotChoice::Yes,
        Some("NO") => BallotChoice::No,
        Some("ABSTAIN") => BallotChoice::Abstain,
        _ => {
            return VoteReply {
                ballot: BallotChoice::Abstain,
                rationale: invalid_format_reason("'ballot' must be YES, NO or ABSTAIN"),
            };
        }
    };

    VoteReply {
        ballot,
        rationale: limits::clip(
            str_field(value, "rationale").unwrap_or("no rationale given"),
            limits::RATIONALE_MAX,
        ),
    }
}

/// Coerce a leader-election reply.
///
/// `member_ids` is the declaration-order roster; a vote for anyone not on it
/// (or an unparseable reply) falls back to the first declared member.
pub fn election(reply: &JsonReply, member_ids: &[&str]) -> ElectionBallot {
    let fallback_candidate = member_ids.first().copied().unwrap_or_default();

    let value = match reply {
        JsonReply::Value(value) => value,
        JsonReply::ParseError { message, .. } => {
            return ElectionBallot {
                candidate_id: fallback_candidate.to_string(),
                rationale: parse_error_reason(message),
            };
        }
    };

    match str_field(value, "candidateId") {
        Some(candidate) if member_ids.contains(&candidate) => ElectionBallot {
            candidate_id: candidate.to_string(),
            rationale: limits::clip(
                str_field(value, "rationale").unwrap_or("no rationale given"),
                limits::RATIONALE_MAX,
            ),
        },
        Some(candidate) => ElectionBallot {
            candidate_id: fallback_candidate.to_string(),
            rationale: invalid_format_reason(&format!("'{candidate}' is not a council member")),
        },
        None => ElectionBallot {
            candidate_id: fallback_candidate.to_string(),
            rationale: invalid_format_reason("expected a 'candidateId' field"),
        },
    }
}

/// Coerce the leader's closing-summary reply.
///
/// On parse failure or a missing summary the fallback summary simply points
/// at the already-adopted resolution, so the session still closes cleanly.
pub fn leader_summary(reply: &JsonReply, adopted_resolution: &str) -> LeaderSummary {
    let fallback = || LeaderSummary {
        summary_markdown: format!(
            "## Session summary\n\nThe leader's structured summary could not be decoded. \
             The council's adopted resolution stands:\n\n> {adopted_resolution}"
        ),
        final_resolution: adopted_resolution.to_string(),
        requires_execution: false,
        execution_brief: None,
    };

    let value = match reply {
        JsonReply::Value(value) => value,
        JsonReply::ParseError { .. } => return fallback(),
    };

    let Some(summary_markdown) = str_field(value, "summaryMarkdown") else {
        return fallback();
    };

    LeaderSummary {
        summary_markdown: summary_markdown.to_string(),
        final_resolution: str_field(value, "finalResolution")
            .unwrap_or(adopted_resolution)
            .to_string(),
        requires_execution: value
            .get("requiresExecution")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        execution_brief: str_field(value, "executionBrief").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(value: Value) -> JsonReply {
        JsonReply::Value(value)
    }

    fn broken() -> JsonReply {
        JsonReply::parse_error("expected value at line 1 column 1", "lol not json")
    }

    #[test]
    fn test_contribute_normalizes() {
        let action = turn_action(&ok(json!({"action": "CONTRIBUTE", "message": "I propose we benchmark first."})));
        assert_eq!(
            action,
            TurnAction::Contribute {
                message: "I propose we benchmark first.".to_string()
            }
        );
    }

    #[test]
    fn test_call_vote_normalizes() {
        let action = turn_action(&ok(json!({
            "action": "CALL_VOTE",
            "title": "Adopt plan B",
            "text": "Plan B is cheaper and simpler.",
            "decisionIfPass": "The council adopts plan B."
        })));
        match action {
            TurnAction::CallVote { title, decision_if_pass, .. } => {
                assert_eq!(title, "Adopt plan B");
                assert_eq!(decision_if_pass, "The council adopts plan B.");
            }
            other => panic!("expected CallVote, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_becomes_pass_with_note() {
        let action = turn_action(&broken());
        match action {
            TurnAction::Pass { reason, note } => {
                assert!(reason.starts_with("Model JSON parse error"));
                assert_eq!(note.as_deref(), Some(AUTO_PASS_NOTE));
            }
            other => panic!("expected Pass, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_action_becomes_pass() {
        let action = turn_action(&ok(json!({"action": "SHOUT", "message": "hi"})));
        match action {
            TurnAction::Pass { reason, .. } => {
                assert!(reason.starts_with("Invalid response format"));
            }
            other => panic!("expected Pass, got {other:?}"),
        }
    }

    #[test]
    fn test_call_vote_missing_fields_becomes_pass() {
        let action = turn_action(&ok(json!({"action": "CALL_VOTE", "title": "Adopt plan B"})));
        assert!(matches!(action, TurnAction::Pass { .. }));
    }

    #[test]
    fn test_overlong_message_is_clipped() {
        let long = "x".repeat(5000);
        let action = turn_action(&ok(json!({"action": "CONTRIBUTE", "message": long})));
        match action {
            TurnAction::Contribute { message } => {
                assert_eq!(message.chars().count(), crate::protocol::limits::MESSAGE_MAX);
            }
            other => panic!("expected Contribute, got {other:?}"),
        }
    }

    #[test]
    fn test_seconding_normalizes() {
        let reply = seconding(&ok(json!({"second": true, "rationale": "worth a vote"})));
        assert!(reply.second);
        assert_eq!(reply.rationale, "worth a vote");
    }

    #[test]
    fn test_seconding_parse_error_declines() {
        let reply = seconding(&broken());
        assert!(!reply.second);
        assert!(reply.rationale.starts_with("Model JSON parse error"));
    }

    #[test]
    fn test_seconding_non_boolean_declines() {
        let reply = seconding(&ok(json!({"second": "yes please"})));
        assert!(!reply.second);
    }

    #[test]
    fn test_vote_normalizes() {
        let reply = vote(&ok(json!({"ballot": "NO", "rationale": "too risky"})));
        assert_eq!(reply.ballot, BallotChoice::No);
    }

    #[test]
    fn test_vote_parse_error_abstains() {
        let reply = vote(&broken());
        assert_eq!(reply.ballot, BallotChoice::Abstain);
        assert!(reply.rationale.starts_with("Model JSON parse error"));
    }

    #[test]
    fn test_vote_invalid_choice_abstains() {
        let reply = vote(&ok(json!({"ballot": "MAYBE"})));
        assert_eq!(reply.ballot, BallotChoice::Abstain);
    }

    #[test]
    fn test_election_normalizes() {
        let members = ["alice", "bob", "carol"];
        let ballot = election(&ok(json!({"candidateId": "bob", "rationale": "steady"})), &members);
        assert_eq!(ballot.candidate_id, "bob");
    }

    #[test]
    fn test_election_unknown_candidate_falls_back_to_first_member() {
        let members = ["alice", "bob", "carol"];
        let ballot = election(&ok(json!({"candidateId": "mallory"})), &members);
        assert_eq!(ballot.candidate_id, "alice");
    }

    #[test]
    fn test_election_parse_error_falls_back_to_first_member() {
        let members = ["alice", "bob", "carol"];
        let ballot = election(&broken(), &members);
        assert_eq!(ballot.candidate_id, "alice");
    }

    #[test]
    fn test_leader_summary_normalizes() {
        let summary = leader_summary(
            &ok(json!({
                "summaryMarkdown": "# Done",
                "finalResolution": "Adopt plan B",
                "requiresExecution": true,
                "executionBrief": "Migrate by Friday"
            })),
            "fallback resolution",
        );
        assert_eq!(summary.summary_markdown, "# Done");
        assert_eq!(summary.final_resolution, "Adopt plan B");
        assert!(summary.requires_execution);
        assert_eq!(summary.execution_brief.as_deref(), Some("Migrate by Friday"));
    }

    #[test]
    fn test_leader_summary_parse_error_uses_adopted_resolution() {
        let summary = leader_summary(&broken(), "Adopt plan B");
        assert!(summary.summary_markdown.contains("Adopt plan B"));
        assert_eq!(summary.final_resolution, "Adopt plan B");
        assert!(!summary.requires_execution);
        assert!(summary.execution_brief.is_none());
    }

    #[test]
    fn test_leader_summary_missing_markdown_falls_back() {
        let summary = leader_summary(&ok(json!({"finalResolution": "x"})), "adopted");
        assert_eq!(summary.final_resolution, "adopted");
    }
}

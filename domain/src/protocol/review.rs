//! Documentation review feedback
//!
//! Reviewers who vote against a documentation draft return a structured
//! feedback document. Malformed blocker entries are dropped; a reviewer
//! whose whole reply is unparseable yields a single synthetic blocker so
//! the leader still observes the deficit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::limits;
use super::reply::JsonReply;

/// Most blockers a single reviewer may raise
pub const MAX_BLOCKERS: usize = 5;
/// Most suggested changes a single reviewer may raise
pub const MAX_SUGGESTIONS: usize = 6;

/// Id of the synthetic blocker inserted for an unparseable review
pub const SYNTHETIC_BLOCKER_ID: &str = "B0";

/// One defect that must be fixed before approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBlocker {
    pub id: String,
    pub section: String,
    pub problem: String,
    pub impact: String,
    pub required_change: String,
    pub severity: String,
}

/// One reviewer's structured feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFeedback {
    /// Member id of the reviewer
    pub reviewer: String,
    pub critical_blockers: Vec<ReviewBlocker>,
    pub suggested_changes: Vec<String>,
}

impl ReviewFeedback {
    /// Decode a reviewer's reply.
    ///
    /// Blocker entries missing any required string field are dropped. An
    /// unparseable reply produces the synthetic [`SYNTHETIC_BLOCKER_ID`]
    /// blocker instead of failing the loop.
    pub fn from_reply(reviewer: &str, reply: &JsonReply) -> Self {
        let value = match reply {
            JsonReply::Value(value) => value,
            JsonReply::ParseError { message, .. } => {
                return Self::synthetic(reviewer, message);
            }
        };

        let critical_blockers = value
            .get("criticalBlockers")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(parse_blocker)
                    .take(MAX_BLOCKERS)
                    .collect()
            })
            .unwrap_or_default();

        let suggested_changes = value
            .get("suggestedChanges")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| limits::clip(s, limits::RATIONALE_MAX))
                    .take(MAX_SUGGESTIONS)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            reviewer: reviewer.to_string(),
            critical_blockers,
            suggested_changes,
        }
    }

    fn synthetic(reviewer: &str, message: &str) -> Self {
        Self {
            reviewer: reviewer.to_string(),
            critical_blockers: vec![ReviewBlocker {
                id: SYNTHETIC_BLOCKER_ID.to_string(),
                section: "(review)".to_string(),
                problem: format!("Reviewer returned an unparseable response: {message}"),
                impact: "The objection behind this NO vote is unknown.".to_string(),
                required_change: "Re-examine the draft against this reviewer's concerns."
                    .to_string(),
                severity: "high".to_string(),
            }],
            suggested_changes: Vec::new(),
        }
    }

    pub fn has_blockers(&self) -> bool {
        !self.critical_blockers.is_empty()
    }
}

fn parse_blocker(entry: &Value) -> Option<ReviewBlocker> {
    let field = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| limits::clip(s, limits::RATIONALE_MAX))
    };
    Some(ReviewBlocker {
        id: field("id")?,
        section: field("section")?,
        problem: field("problem")?,
        impact: field("impact")?,
        required_change: field("requiredChange")?,
        severity: field("severity")?,
    })
}

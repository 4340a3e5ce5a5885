//! Phase transition resolution
//!
//! Pure mapping from `(phase, how it ended)` to the next phase id, or `None`
//! to terminate the session. Selection is deterministic: eligible edges are
//! ordered by `(priority asc, target id asc)` and the head wins.

use serde::{Deserialize, Serialize};

use super::entities::{FallbackAction, Phase, TransitionTrigger};

/// How a phase reached its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndedBy {
    /// A motion passed and the phase closed on it
    MajorityVote,
    /// The round limit was exhausted without a passing motion
    RoundLimit,
}

impl EndedBy {
    /// The transition trigger this outcome satisfies
    pub fn trigger(self) -> TransitionTrigger {
        match self {
            EndedBy::MajorityVote => TransitionTrigger::MajorityVote,
            EndedBy::RoundLimit => TransitionTrigger::RoundLimit,
        }
    }
}

impl std::fmt::Display for EndedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndedBy::MajorityVote => write!(f, "MAJORITY_VOTE"),
            EndedBy::RoundLimit => write!(f, "ROUND_LIMIT"),
        }
    }
}

/// Resolve the next phase after `phase` ended with `ended_by`.
///
/// Returns `Some(target id)` or `None` to terminate. When the phase ended by
/// round limit and no declared transition matched, the phase fallback's
/// `Transition` action is honored as a synthetic lowest-priority edge.
pub fn resolve_transition(phase: &Phase, ended_by: EndedBy) -> Option<&str> {
    let mut eligible: Vec<_> = phase
        .transitions
        .iter()
        .filter(|t| t.when == TransitionTrigger::Always || t.when == ended_by.trigger())
        .collect();

    eligible.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.to.cmp(&b.to)));

    if let Some(head) = eligible.first() {
        return Some(&head.to);
    }

    if ended_by == EndedBy::RoundLimit
        && phase.fallback.action == FallbackAction::Transition
        && let Some(target) = phase.fallback.transition_to_phase_id.as_deref()
    {
        return Some(target);
    }

    None
}

//! Phase entities and governance parameters

use serde::{Deserialize, Serialize};

/// What triggers a transition out of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionTrigger {
    /// A motion passed and the phase closed on it
    MajorityVote,
    /// The phase exhausted its round limit
    RoundLimit,
    /// Taken regardless of how the phase ended
    Always,
}

/// One outgoing edge of the phase graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Target phase id
    pub to: String,
    /// Trigger condition
    pub when: TransitionTrigger,
    /// Lower values are preferred
    pub priority: u32,
}

/// What to do when a phase ends by round limit and no transition applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FallbackAction {
    EndSession,
    Transition,
}

/// Fallback resolution for a phase that never reached consensus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseFallback {
    /// Resolution text adopted when the round limit is hit
    pub resolution: String,
    pub action: FallbackAction,
    /// Target phase when `action` is `Transition`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_to_phase_id: Option<String>,
}

/// Voting governance for a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Governance {
    /// Whether a motion needs a seconder before going to a vote
    pub require_seconding: bool,
    /// Fraction of the full council that must vote YES, in (0, 1]
    pub majority_threshold: f64,
    /// Whether an abstention is counted as an effective NO
    pub abstain_counts_as_no: bool,
}

impl Default for Governance {
    fn default() -> Self {
        Self {
            require_seconding: true,
            majority_threshold: 0.5,
            abstain_counts_as_no: true,
        }
    }
}

/// When a phase stops iterating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopConditions {
    /// Maximum number of full round-robin rounds
    pub max_rounds: u32,
    /// Whether a passing motion closes the phase immediately
    pub end_on_majority_vote: bool,
}

impl Default for StopConditions {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            end_on_majority_vote: true,
        }
    }
}

/// Which memory surfaces a phase reads and writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryPolicy {
    pub read_member_memory: bool,
    pub write_member_memory: bool,
    pub write_council_memory: bool,
    pub include_prior_phase_summary: bool,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            read_member_memory: true,
            write_member_memory: true,
            write_council_memory: true,
            include_prior_phase_summary: true,
        }
    }
}

/// Evidence obligations surfaced to members in the phase context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceRequirements {
    pub min_citations: u32,
    pub require_explicit_assumptions: bool,
    pub require_risk_register: bool,
}

/// An expected output of a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: String,
    pub description: String,
    pub required: bool,
}

/// A node in the deliberation graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Unique, stable phase id
    pub id: String,
    /// One-line statement of what the phase is for
    pub goal: String,
    /// Guidance lines injected into member prompts
    pub prompt_guidance: Vec<String>,
    pub deliverables: Vec<Deliverable>,
    pub governance: Governance,
    pub stop_conditions: StopConditions,
    pub memory_policy: MemoryPolicy,
    pub evidence_requirements: EvidenceRequirements,
    pub quality_gates: Vec<String>,
    pub fallback: PhaseFallback,
    pub transitions: Vec<PhaseTransition>,
}

impl Phase {
    /// Deliverables that are marked required, rendered for prompt context
    pub fn required_deliverables(&self) -> impl Iterator<Item = &Deliverable> {
        self.deliverables.iter().filter(|d| d.required)
    }
}

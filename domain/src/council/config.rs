//! Council configuration entities

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::phase::entities::Phase;

/// Reference to the model backing a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRef {
    /// Provider identifier (e.g. "openai", "anthropic", "local")
    pub provider: String,
    /// Model name as the provider knows it
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A council participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique, stable member id
    pub id: String,
    pub name: String,
    pub role: String,
    /// Persona instructions prepended to every prompt for this member
    pub system_prompt: String,
    pub traits: Vec<String>,
    /// Topic -> weight mapping describing where this member focuses
    pub focus_weights: BTreeMap<String, f64>,
    pub model: ModelRef,
}

/// How much phase context is injected into member prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextVerbosity {
    Minimal,
    #[default]
    Standard,
    Full,
}

/// Session-level sequencing policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Phase the session starts in
    pub entry_phase_id: String,
    /// Upper bound on completed phases; exceeding it forces termination
    pub max_phase_transitions: u32,
    pub phase_context_verbosity: ContextVerbosity,
}

impl SessionPolicy {
    pub const DEFAULT_MAX_PHASE_TRANSITIONS: u32 = 12;
}

/// What the session produces beyond the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    None,
    Documentation,
}

/// Bounds for the documentation review loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationReviewPolicy {
    /// Number of revision rounds after the initial draft
    pub max_revision_rounds: u32,
}

impl Default for DocumentationReviewPolicy {
    fn default() -> Self {
        Self {
            max_revision_rounds: 2,
        }
    }
}

/// Where session artifacts and member memory live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoragePolicy {
    pub root_dir: PathBuf,
    pub memory_dir: PathBuf,
}

/// Gate between a deliberated outcome and anything that executes it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    pub require_human_approval: bool,
    pub default_executor_profile: String,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            require_human_approval: true,
            default_executor_profile: "general".to_string(),
        }
    }
}

/// Immutable input spec for a deliberation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    pub council_name: String,
    pub purpose: String,
    /// Ordered roster; size must be odd and at least 3
    pub members: Vec<Member>,
    /// Optional speaking order; must be a permutation of member ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_order: Option<Vec<String>>,
    pub phases: Vec<Phase>,
    pub session: SessionPolicy,
    pub output: OutputType,
    pub documentation_review: DocumentationReviewPolicy,
    pub storage: StoragePolicy,
    pub execution: ExecutionPolicy,
}

impl CouncilConfig {
    /// Number of seats on the council
    pub fn council_size(&self) -> usize {
        self.members.len()
    }

    /// Look up a member by id
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Look up a phase by id
    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// Members in speaking order: `turn_order` when declared, otherwise
    /// declaration order. Applied identically to every round of every phase.
    pub fn speaking_order(&self) -> Vec<&Member> {
        match &self.turn_order {
            Some(order) => order
                .iter()
                .filter_map(|id| self.member(id))
                .collect(),
            None => self.members.iter().collect(),
        }
    }

    /// Member ids in declaration order
    pub fn member_ids(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.id.as_str()).collect()
    }
}

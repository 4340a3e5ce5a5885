//! Raw JSON configuration data types
//!
//! These structs represent the exact structure of the JSON config file.
//! They deserialize leniently (camelCase keys, defaults for everything the
//! operator may omit) and convert into the strict domain [`CouncilConfig`],
//! which is then validated as a whole.

use std::collections::BTreeMap;
use std::path::PathBuf;

use conclave_domain::{
    ContextVerbosity, CouncilConfig, Deliverable, DocumentationReviewPolicy, EvidenceRequirements,
    ExecutionPolicy, FallbackAction, Governance, Member, MemoryPolicy, ModelRef, OutputType, Phase,
    PhaseFallback, PhaseTransition, SessionPolicy, StopConditions, StoragePolicy,
    TransitionTrigger,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    pub council_name: String,
    pub purpose: String,
    pub members: Vec<FileMember>,
    pub turn_order: Option<Vec<String>>,
    pub phases: Vec<FilePhase>,
    pub session_policy: FileSessionPolicy,
    pub output: FileOutput,
    pub documentation_review: FileDocumentationReview,
    pub storage: FileStorage,
    pub execution: FileExecution,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileMember {
    pub id: String,
    pub name: String,
    pub role: String,
    pub system_prompt: String,
    pub traits: Vec<String>,
    pub focus_weights: BTreeMap<String, f64>,
    pub model: FileModelRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileModelRef {
    pub provider: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Default for FileModelRef {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilePhase {
    pub id: String,
    pub goal: String,
    pub prompt_guidance: Vec<String>,
    pub deliverables: Vec<FileDeliverable>,
    pub governance: FileGovernance,
    pub stop_conditions: FileStopConditions,
    pub memory_policy: FileMemoryPolicy,
    pub evidence_requirements: FileEvidenceRequirements,
    pub quality_gates: Vec<String>,
    pub fallback: FileFallback,
    pub transitions: Vec<FileTransition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDeliverable {
    pub id: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileGovernance {
    pub require_seconding: bool,
    pub majority_threshold: f64,
    pub abstain_counts_as_no: bool,
}

impl Default for FileGovernance {
    fn default() -> Self {
        Self {
            require_seconding: true,
            majority_threshold: 0.5,
            abstain_counts_as_no: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileStopConditions {
    pub max_rounds: u32,
    pub end_on_majority_vote: bool,
}

impl Default for FileStopConditions {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            end_on_majority_vote: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileMemoryPolicy {
    pub read_member_memory: bool,
    pub write_member_memory: bool,
    pub write_council_memory: bool,
    pub include_prior_phase_summary: bool,
}

impl Default for FileMemoryPolicy {
    fn default() -> Self {
        Self {
            read_member_memory: true,
            write_member_memory: true,
            write_council_memory: true,
            include_prior_phase_summary: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileEvidenceRequirements {
    pub min_citations: u32,
    pub require_explicit_assumptions: bool,
    pub require_risk_register: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileFallback {
    pub resolution: String,
    /// `END_SESSION` or `TRANSITION`
    pub action: String,
    pub transition_to_phase_id: Option<String>,
}

impl Default for FileFallback {
    fn default() -> Self {
        Self {
            resolution: "The council reached no consensus.".to_string(),
            action: "END_SESSION".to_string(),
            transition_to_phase_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileTransition {
    pub to: String,
    /// `MAJORITY_VOTE`, `ROUND_LIMIT` or `ALWAYS`
    pub when: String,
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSessionPolicy {
    pub entry_phase_id: String,
    pub max_phase_transitions: u32,
    /// `minimal`, `standard` or `full`
    pub phase_context_verbosity: String,
}

impl Default for FileSessionPolicy {
    fn default() -> Self {
        Self {
            entry_phase_id: String::new(),
            max_phase_transitions: SessionPolicy::DEFAULT_MAX_PHASE_TRANSITIONS,
            phase_context_verbosity: "standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileOutput {
    /// `none` or `documentation`
    #[serde(rename = "type")]
    pub output_type: String,
}

impl Default for FileOutput {
    fn default() -> Self {
        Self {
            output_type: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDocumentationReview {
    pub max_revision_rounds: u32,
}

impl Default for FileDocumentationReview {
    fn default() -> Self {
        Self {
            max_revision_rounds: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileStorage {
    pub root_dir: PathBuf,
    pub memory_dir: PathBuf,
}

impl Default for FileStorage {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(".conclave"),
            memory_dir: PathBuf::from(".conclave/memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileExecution {
    pub require_human_approval: bool,
    pub default_executor_profile: String,
}

impl Default for FileExecution {
    fn default() -> Self {
        Self {
            require_human_approval: true,
            default_executor_profile: "general".to_string(),
        }
    }
}

/// A field whose value is not one of the recognized names
#[derive(Debug, Clone)]
pub struct UnknownVariant {
    pub field: String,
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized value '{}' for {}", self.value, self.field)
    }
}

fn parse_trigger(field: &str, value: &str) -> Result<TransitionTrigger, UnknownVariant> {
    match value {
        "MAJORITY_VOTE" => Ok(TransitionTrigger::MajorityVote),
        "ROUND_LIMIT" => Ok(TransitionTrigger::RoundLimit),
        "ALWAYS" => Ok(TransitionTrigger::Always),
        other => Err(UnknownVariant {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

impl FileConfig {
    /// Convert into the strict domain configuration.
    ///
    /// Only enum-name mapping can fail here; structural problems are left to
    /// [`CouncilConfig::validate`].
    pub fn into_domain(self) -> Result<CouncilConfig, UnknownVariant> {
        let verbosity = match self.session_policy.phase_context_verbosity.as_str() {
            "minimal" => ContextVerbosity::Minimal,
            "standard" => ContextVerbosity::Standard,
            "full" => ContextVerbosity::Full,
            other => {
                return Err(UnknownVariant {
                    field: "sessionPolicy.phaseContextVerbosity".to_string(),
                    value: other.to_string(),
                });
            }
        };

        let output = match self.output.output_type.as_str() {
            "none" => OutputType::None,
            "documentation" => OutputType::Documentation,
            other => {
                return Err(UnknownVariant {
                    field: "output.type".to_string(),
                    value: other.to_string(),
                });
            }
        };

        let mut phases = Vec::with_capacity(self.phases.len());
        for phase in self.phases {
            let action = match phase.fallback.action.as_str() {
                "END_SESSION" => FallbackAction::EndSession,
                "TRANSITION" => FallbackAction::Transition,
                other => {
                    return Err(UnknownVariant {
                        field: format!("phases.{}.fallback.action", phase.id),
                        value: other.to_string(),
                    });
                }
            };

            let mut transitions = Vec::with_capacity(phase.transitions.len());
            for transition in phase.transitions {
                transitions.push(PhaseTransition {
                    to: transition.to,
                    when: parse_trigger(
                        &format!("phases.{}.transitions.when", phase.id),
                        &transition.when,
                    )?,
                    priority: transition.priority,
                });
            }

            phases.push(Phase {
                id: phase.id,
                goal: phase.goal,
                prompt_guidance: phase.prompt_guidance,
                deliverables: phase
                    .deliverables
                    .into_iter()
                    .map(|d| Deliverable {
                        id: d.id,
                        description: d.description,
                        required: d.required,
                    })
                    .collect(),
                governance: Governance {
                    require_seconding: phase.governance.require_seconding,
                    majority_threshold: phase.governance.majority_threshold,
                    abstain_counts_as_no: phase.governance.abstain_counts_as_no,
                },
                stop_conditions: StopConditions {
                    max_rounds: phase.stop_conditions.max_rounds,
                    end_on_majority_vote: phase.stop_conditions.end_on_majority_vote,
                },
                memory_policy: MemoryPolicy {
                    read_member_memory: phase.memory_policy.read_member_memory,
                    write_member_memory: phase.memory_policy.write_member_memory,
                    write_council_memory: phase.memory_policy.write_council_memory,
                    include_prior_phase_summary: phase.memory_policy.include_prior_phase_summary,
                },
                evidence_requirements: EvidenceRequirements {
                    min_citations: phase.evidence_requirements.min_citations,
                    require_explicit_assumptions: phase
                        .evidence_requirements
                        .require_explicit_assumptions,
                    require_risk_register: phase.evidence_requirements.require_risk_register,
                },
                quality_gates: phase.quality_gates,
                fallback: PhaseFallback {
                    resolution: phase.fallback.resolution,
                    action,
                    transition_to_phase_id: phase.fallback.transition_to_phase_id,
                },
                transitions,
            });
        }

        Ok(CouncilConfig {
            council_name: self.council_name,
            purpose: self.purpose,
            members: self
                .members
                .into_iter()
                .map(|m| Member {
                    id: m.id,
                    name: m.name,
                    role: m.role,
                    system_prompt: m.system_prompt,
                    traits: m.traits,
                    focus_weights: m.focus_weights,
                    model: ModelRef {
                        provider: m.model.provider,
                        model: m.model.model,
                        temperature: m.model.temperature,
                        max_tokens: m.model.max_tokens,
                    },
                })
                .collect(),
            turn_order: self.turn_order,
            phases,
            session: SessionPolicy {
                entry_phase_id: self.session_policy.entry_phase_id,
                max_phase_transitions: self.session_policy.max_phase_transitions,
                phase_context_verbosity: verbosity,
            },
            output,
            documentation_review: DocumentationReviewPolicy {
                max_revision_rounds: self.documentation_review.max_revision_rounds,
            },
            storage: StoragePolicy {
                root_dir: self.storage.root_dir,
                memory_dir: self.storage.memory_dir,
            },
            execution: ExecutionPolicy {
                require_human_approval: self.execution.require_human_approval,
                default_executor_profile: self.execution.default_executor_profile,
            },
        })
    }
}

//! Phase context packet
//!
//! A bounded description of "where the deliberation stands" injected into
//! every member prompt. Verbosity is configurable per session: `minimal`
//! carries identity and counters only, `standard` adds deliverables, gates,
//! evidence gaps and legal next phases, and `full` appends a condensed
//! graph digest plus the packet itself as JSON.

use serde::{Deserialize, Serialize};

use super::entities::Phase;
use crate::council::config::ContextVerbosity;

/// Snapshot of the current phase for prompt injection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseContextPacket {
    pub phase_id: String,
    pub goal: String,
    pub round: u32,
    pub max_rounds: u32,
    /// Rendered deliverable lines, required deliverables first
    pub pending_deliverables: Vec<String>,
    pub quality_gates: Vec<String>,
    /// Unmet evidence obligations, derived from the phase's requirements
    pub evidence_gaps: Vec<String>,
    /// "target (on TRIGGER, priority N)" lines
    pub next_phases: Vec<String>,
    /// "id -> [edges]" lines for the whole graph; populated at full verbosity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_digest: Option<Vec<String>>,
}

impl PhaseContextPacket {
    pub fn build(
        phase: &Phase,
        round: u32,
        all_phases: &[Phase],
        verbosity: ContextVerbosity,
    ) -> Self {
        let mut deliverables: Vec<&super::entities::Deliverable> =
            phase.deliverables.iter().collect();
        deliverables.sort_by_key(|d| !d.required);
        let pending_deliverables = deliverables
            .iter()
            .map(|d| {
                if d.required {
                    format!("{} — {} (required)", d.id, d.description)
                } else {
                    format!("{} — {}", d.id, d.description)
                }
            })
            .collect();

        let mut evidence_gaps = Vec::new();
        let evidence = &phase.evidence_requirements;
        if evidence.min_citations > 0 {
            evidence_gaps.push(format!(
                "at least {} citation(s) expected in contributions",
                evidence.min_citations
            ));
        }
        if evidence.require_explicit_assumptions {
            evidence_gaps.push("assumptions must be stated explicitly".to_string());
        }
        if evidence.require_risk_register {
            evidence_gaps.push("a risk register entry is expected".to_string());
        }

        let next_phases = phase
            .transitions
            .iter()
            .map(|t| format!("{} (on {:?}, priority {})", t.to, t.when, t.priority))
            .collect();

        let graph_digest = if verbosity == ContextVerbosity::Full {
            Some(
                all_phases
                    .iter()
                    .map(|p| {
                        let edges: Vec<String> = p
                            .transitions
                            .iter()
                            .map(|t| format!("{}({:?})", t.to, t.when))
                            .collect();
                        if edges.is_empty() {
                            format!("{} -> (terminal)", p.id)
                        } else {
                            format!("{} -> [{}]", p.id, edges.join(", "))
                        }
                    })
                    .collect(),
            )
        } else {
            None
        };

        Self {
            phase_id: phase.id.clone(),
            goal: phase.goal.clone(),
            round,
            max_rounds: phase.stop_conditions.max_rounds,
            pending_deliverables,
            quality_gates: phase.quality_gates.clone(),
            evidence_gaps,
            next_phases,
            graph_digest,
        }
    }

    /// Render for prompt injection at the given verbosity.
    pub fn render(&self, verbosity: ContextVerbosity) -> String {
        let mut out = format!(
            "Phase: {} — {}\nRound {} of {}",
            self.phase_id, self.goal, self.round, self.max_rounds
        );

        if verbosity == ContextVerbosity::Minimal {
            return out;
        }

        for (label, lines) in [
            ("Pending deliverables", &self.pending_deliverables),
            ("Quality gates", &self.quality_gates),
            ("Evidence gaps", &self.evidence_gaps),
            ("Possible next phases", &self.next_phases),
        ] {
            if lines.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{label}:\n"));
            for line in lines {
                out.push_str(&format!("- {line}\n"));
            }
            out.pop();
        }

        if verbosity == ContextVerbosity::Full {
            if let Some(digest) = &self.graph_digest {
                out.push_str("\nPhase graph:\n");
                for line in digest {
                    out.push_str(&format!("- {line}\n"));
                }
                out.pop();
            }
            if let Ok(json) = serde_json::to_string(self) {
                out.push_str("\nContext packet JSON: ");
                out.push_str(&json);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::entities::{
        Deliverable, EvidenceRequirements, FallbackAction, Governance, MemoryPolicy, PhaseFallback,
        PhaseTransition, StopConditions, TransitionTrigger,
    };

    fn sample_phase() -> Phase {
        Phase {
            id: "scope".to_string(),
            goal: "agree on scope".to_string(),
            prompt_guidance: vec![],
            deliverables: vec![
                Deliverable {
                    id: "optional-notes".to_string(),
                    description: "side notes".to_string(),
                    required: false,
                },
                Deliverable {
                    id: "scope-doc".to_string(),
                    description: "scope statement".to_string(),
                    required: true,
                },
            ],
            governance: Governance::default(),
            stop_conditions: StopConditions {
                max_rounds: 4,
                end_on_majority_vote: true,
            },
            memory_policy: MemoryPolicy::default(),
            evidence_requirements: EvidenceRequirements {
                min_citations: 2,
                require_explicit_assumptions: true,
                require_risk_register: false,
            },
            quality_gates: vec!["scope fits one quarter".to_string()],
            fallback: PhaseFallback {
                resolution: "no consensus".to_string(),
                action: FallbackAction::EndSession,
                transition_to_phase_id: None,
            },
            transitions: vec![PhaseTransition {
                to: "plan".to_string(),
                when: TransitionTrigger::MajorityVote,
                priority: 0,
            }],
        }
    }

    #[test]
    fn test_minimal_renders_identity_and_counters_only() {
        let phase = sample_phase();
        let packet = PhaseContextPacket::build(&phase, 2, &[phase.clone()], ContextVerbosity::Minimal);
        let rendered = packet.render(ContextVerbosity::Minimal);
        assert!(rendered.contains("Round 2 of 4"));
        assert!(!rendered.contains("deliverables"));
    }

    #[test]
    fn test_standard_lists_deliverables_required_first() {
        let phase = sample_phase();
        let packet =
            PhaseContextPacket::build(&phase, 1, &[phase.clone()], ContextVerbosity::Standard);
        assert!(packet.pending_deliverables[0].starts_with("scope-doc"));
        let rendered = packet.render(ContextVerbosity::Standard);
        assert!(rendered.contains("scope-doc — scope statement (required)"));
        assert!(rendered.contains("at least 2 citation(s)"));
        assert!(rendered.contains("plan (on MajorityVote"));
    }

    #[test]
    fn test_full_appends_graph_digest_and_json() {
        let phase = sample_phase();
        let packet = PhaseContextPacket::build(&phase, 1, &[phase.clone()], ContextVerbosity::Full);
        let rendered = packet.render(ContextVerbosity::Full);
        assert!(rendered.contains("Phase graph:"));
        assert!(rendered.contains("scope -> [plan(MajorityVote)]"));
        assert!(rendered.contains("Context packet JSON: {"));
    }
}

//! Council configuration validation
//!
//! Detects structural problems in a [`CouncilConfig`] before any session
//! activity: bad council arity, duplicate ids, dangling phase references,
//! invalid thresholds, and unreachable phases. Every issue carries a
//! severity; a config with any `Error` issue must not start a session.

use std::collections::{BTreeSet, VecDeque};

use super::config::CouncilConfig;
use crate::phase::entities::FallbackAction;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot run at all.
    Error,
    /// Non-fatal: the configuration runs but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssueCode {
    /// Council size is below three.
    TooFewMembers,
    /// Council size is even; blind votes could deadlock.
    EvenCouncilSize,
    /// Two members share an id.
    DuplicateMemberId(String),
    /// Two phases share an id.
    DuplicatePhaseId(String),
    /// `turn_order` is not a permutation of the member ids.
    InvalidTurnOrder,
    /// The entry phase id names no declared phase.
    UnknownEntryPhase(String),
    /// A transition targets a phase that does not exist.
    UnknownTransitionTarget { phase: String, target: String },
    /// A fallback transition targets a phase that does not exist.
    UnknownFallbackTarget { phase: String, target: String },
    /// A fallback declares `Transition` without naming a target.
    MissingFallbackTarget(String),
    /// A phase cannot be reached from the entry phase.
    UnreachablePhase(String),
    /// A majority threshold outside (0, 1].
    InvalidThreshold { phase: String, value: f64 },
    /// A phase with a zero round limit would never run a turn.
    ZeroMaxRounds(String),
    /// An empty required string field.
    EmptyField(&'static str),
}

/// A detected issue in a council configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

impl CouncilConfig {
    /// Validate the whole configuration, returning all detected issues.
    ///
    /// An empty list means the configuration is ready to run.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.council_name.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyField("councilName"),
                "councilName must be a non-empty string",
            ));
        }
        if self.purpose.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyField("purpose"),
                "purpose must be a non-empty string",
            ));
        }

        self.validate_members(&mut issues);
        self.validate_phases(&mut issues);
        self.validate_reachability(&mut issues);

        issues
    }

    /// True when no `Error`-severity issue was found.
    pub fn is_valid(&self) -> bool {
        self.validate()
            .iter()
            .all(|i| i.severity != Severity::Error)
    }

    fn validate_members(&self, issues: &mut Vec<ConfigIssue>) {
        if self.members.len() < 3 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TooFewMembers,
                format!("council needs at least 3 members, found {}", self.members.len()),
            ));
        }
        if self.members.len() % 2 == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EvenCouncilSize,
                format!(
                    "council size must be odd to avoid deadlocked votes, found {}",
                    self.members.len()
                ),
            ));
        }

        let mut seen = BTreeSet::new();
        for member in &self.members {
            if !seen.insert(member.id.as_str()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicateMemberId(member.id.clone()),
                    format!("duplicate member id '{}'", member.id),
                ));
            }
        }

        if let Some(order) = &self.turn_order {
            let declared: BTreeSet<&str> = self.members.iter().map(|m| m.id.as_str()).collect();
            let ordered: BTreeSet<&str> = order.iter().map(|s| s.as_str()).collect();
            if order.len() != self.members.len() || declared != ordered {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidTurnOrder,
                    "turnOrder must be a permutation of the declared member ids",
                ));
            }
        }
    }

    fn validate_phases(&self, issues: &mut Vec<ConfigIssue>) {
        let mut seen = BTreeSet::new();
        for phase in &self.phases {
            if !seen.insert(phase.id.as_str()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::DuplicatePhaseId(phase.id.clone()),
                    format!("duplicate phase id '{}'", phase.id),
                ));
            }

            let threshold = phase.governance.majority_threshold;
            if !(threshold > 0.0 && threshold <= 1.0) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidThreshold {
                        phase: phase.id.clone(),
                        value: threshold,
                    },
                    format!(
                        "phase '{}' majorityThreshold must be in (0, 1], found {}",
                        phase.id, threshold
                    ),
                ));
            }

            if phase.stop_conditions.max_rounds == 0 {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::ZeroMaxRounds(phase.id.clone()),
                    format!("phase '{}' has maxRounds 0 and will resolve by fallback", phase.id),
                ));
            }

            for transition in &phase.transitions {
                if self.phase(&transition.to).is_none() {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::UnknownTransitionTarget {
                            phase: phase.id.clone(),
                            target: transition.to.clone(),
                        },
                        format!(
                            "phase '{}' transitions to unknown phase '{}'",
                            phase.id, transition.to
                        ),
                    ));
                }
            }

            match (&phase.fallback.action, &phase.fallback.transition_to_phase_id) {
                (FallbackAction::Transition, Some(target)) => {
                    if self.phase(target).is_none() {
                        issues.push(ConfigIssue::error(
                            ConfigIssueCode::UnknownFallbackTarget {
                                phase: phase.id.clone(),
                                target: target.clone(),
                            },
                            format!(
                                "phase '{}' fallback transitions to unknown phase '{}'",
                                phase.id, target
                            ),
                        ));
                    }
                }
                (FallbackAction::Transition, None) => {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::MissingFallbackTarget(phase.id.clone()),
                        format!(
                            "phase '{}' fallback action is TRANSITION but names no target",
                            phase.id
                        ),
                    ));
                }
                (FallbackAction::EndSession, _) => {}
            }
        }

        if self.phase(&self.session.entry_phase_id).is_none() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownEntryPhase(self.session.entry_phase_id.clone()),
                format!("entryPhaseId '{}' names no declared phase", self.session.entry_phase_id),
            ));
        }
    }

    /// Every declared phase must be reachable from the entry phase by
    /// following transitions and fallback-transition edges.
    fn validate_reachability(&self, issues: &mut Vec<ConfigIssue>) {
        if self.phase(&self.session.entry_phase_id).is_none() {
            // Already reported as UnknownEntryPhase.
            return;
        }

        let mut reached = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.session.entry_phase_id.as_str());

        while let Some(id) = queue.pop_front() {
            if !reached.insert(id) {
                continue;
            }
            let Some(phase) = self.phase(id) else { continue };
            for transition in &phase.transitions {
                queue.push_back(&transition.to);
            }
            if let Some(target) = phase.fallback.transition_to_phase_id.as_deref() {
                queue.push_back(target);
            }
        }

        for phase in &self.phases {
            if !reached.contains(phase.id.as_str()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnreachablePhase(phase.id.clone()),
                    format!(
                        "phase '{}' is not reachable from entry phase '{}'",
                        phase.id, self.session.entry_phase_id
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::config::{
        ContextVerbosity, DocumentationReviewPolicy, ExecutionPolicy, Member, ModelRef, OutputType,
        SessionPolicy, StoragePolicy,
    };
    use crate::phase::entities::{
        EvidenceRequirements, Governance, MemoryPolicy, Phase, PhaseFallback, PhaseTransition,
        StopConditions, TransitionTrigger,
    };
    use std::collections::BTreeMap;

    fn member(id: &str) -> Member {
        Member {
            id: id.to_string(),
            name: id.to_uppercase(),
            role: "advisor".to_string(),
            system_prompt: "You advise.".to_string(),
            traits: vec![],
            focus_weights: BTreeMap::new(),
            model: ModelRef {
                provider: "test".to_string(),
                model: "test-model".to_string(),
                temperature: None,
                max_tokens: None,
            },
        }
    }

    fn phase(id: &str, transitions: Vec<PhaseTransition>) -> Phase {
        Phase {
            id: id.to_string(),
            goal: format!("goal of {id}"),
            prompt_guidance: vec![],
            deliverables: vec![],
            governance: Governance::default(),
            stop_conditions: StopConditions::default(),
            memory_policy: MemoryPolicy::default(),
            evidence_requirements: EvidenceRequirements::default(),
            quality_gates: vec![],
            fallback: PhaseFallback {
                resolution: "no consensus".to_string(),
                action: crate::phase::entities::FallbackAction::EndSession,
                transition_to_phase_id: None,
            },
            transitions,
        }
    }

    fn config(members: Vec<Member>, phases: Vec<Phase>, entry: &str) -> CouncilConfig {
        CouncilConfig {
            council_name: "test council".to_string(),
            purpose: "testing".to_string(),
            members,
            turn_order: None,
            phases,
            session: SessionPolicy {
                entry_phase_id: entry.to_string(),
                max_phase_transitions: 12,
                phase_context_verbosity: ContextVerbosity::Standard,
            },
            output: OutputType::None,
            documentation_review: DocumentationReviewPolicy::default(),
            storage: StoragePolicy {
                root_dir: "/tmp/conclave".into(),
                memory_dir: "/tmp/conclave/memory".into(),
            },
            execution: ExecutionPolicy::default(),
        }
    }

    fn errors(config: &CouncilConfig) -> Vec<ConfigIssueCode> {
        config
            .validate()
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_valid_config_has_no_errors() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("main", vec![])],
            "main",
        );
        assert!(errors(&cfg).is_empty());
        assert!(cfg.is_valid());
    }

    #[test]
    fn test_even_council_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c"), member("d")],
            vec![phase("main", vec![])],
            "main",
        );
        assert!(errors(&cfg).contains(&ConfigIssueCode::EvenCouncilSize));
    }

    #[test]
    fn test_too_few_members_rejected() {
        let cfg = config(vec![member("a")], vec![phase("main", vec![])], "main");
        assert!(errors(&cfg).contains(&ConfigIssueCode::TooFewMembers));
    }

    #[test]
    fn test_duplicate_member_id_rejected() {
        let cfg = config(
            vec![member("a"), member("a"), member("c")],
            vec![phase("main", vec![])],
            "main",
        );
        assert!(
            errors(&cfg).contains(&ConfigIssueCode::DuplicateMemberId("a".to_string()))
        );
    }

    #[test]
    fn test_bad_turn_order_rejected() {
        let mut cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("main", vec![])],
            "main",
        );
        cfg.turn_order = Some(vec!["a".to_string(), "b".to_string()]);
        assert!(errors(&cfg).contains(&ConfigIssueCode::InvalidTurnOrder));

        cfg.turn_order = Some(vec!["c".to_string(), "a".to_string(), "b".to_string()]);
        assert!(cfg.is_valid());
    }

    #[test]
    fn test_unknown_entry_phase_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("main", vec![])],
            "missing",
        );
        assert!(
            errors(&cfg).contains(&ConfigIssueCode::UnknownEntryPhase("missing".to_string()))
        );
    }

    #[test]
    fn test_unreachable_phase_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase("main", vec![]), phase("island", vec![])],
            "main",
        );
        assert!(
            errors(&cfg).contains(&ConfigIssueCode::UnreachablePhase("island".to_string()))
        );
    }

    #[test]
    fn test_phase_reached_through_fallback_counts() {
        let mut main = phase("main", vec![]);
        main.fallback.action = crate::phase::entities::FallbackAction::Transition;
        main.fallback.transition_to_phase_id = Some("triage".to_string());

        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![main, phase("triage", vec![])],
            "main",
        );
        assert!(cfg.is_valid());
    }

    #[test]
    fn test_dangling_transition_rejected() {
        let cfg = config(
            vec![member("a"), member("b"), member("c")],
            vec![phase(
                "main",
                vec![PhaseTransition {
                    to: "nowhere".to_string(),
                    when: TransitionTrigger::Always,
                    priority: 0,
                }],
            )],
            "main",
        );
        assert!(errors(&cfg).iter().any(|c| matches!(
            c,
            ConfigIssueCode::UnknownTransitionTarget { .. }
        )));
    }

    #[test]
    fn test_threshold_bounds() {
        let mut bad = phase("main", vec![]);
        bad.governance.majority_threshold = 0.0;
        let cfg = config(vec![member("a"), member("b"), member("c")], vec![bad], "main");
        assert!(errors(&cfg)
            .iter()
            .any(|c| matches!(c, ConfigIssueCode::InvalidThreshold { .. })));

        let mut good = phase("main", vec![]);
        good.governance.majority_threshold = 1.0;
        let cfg = config(vec![member("a"), member("b"), member("c")], vec![good], "main");
        assert!(cfg.is_valid());
    }
}

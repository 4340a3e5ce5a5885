//! Session orchestrator
//!
//! Single entry point for a deliberation: leader election, phase sequencing
//! through the transition resolver, the leader summary, the optional
//! documentation loop, the execution handoff, and finalization. The
//! orchestrator instance exclusively owns all mutable session state.

use std::collections::HashMap;
use std::sync::Arc;

use conclave_domain::{
    CouncilConfig, EndedBy, EventKind, ExecutionHandoff, JsonReply, OutputType, PhaseResult,
    PhaseState, PromptTemplate, SessionMemoryInput, SessionOutcome, SessionStateDoc, Severity,
    normalize, resolve_transition,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::documentation::DocumentationLoop;
use super::election::elect_leader;
use super::error::SessionError;
use super::fan_out::check_cancelled;
use super::phase_runner::PhaseRunner;
use super::scribe::EventScribe;
use super::{SessionState, client_for, options_for};
use crate::ports::clock::{Clock, IdGenerator};
use crate::ports::memory_store::MemoryStore;
use crate::ports::model_client::ModelClient;
use crate::ports::recorder::SessionRecorder;

/// Everything a session needs from the outside world
pub struct SessionDeps {
    pub config: Arc<CouncilConfig>,
    /// Member id -> model client
    pub clients: HashMap<String, Arc<dyn ModelClient>>,
    pub recorder: Arc<dyn SessionRecorder>,
    pub memory: Arc<dyn MemoryStore>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
}

/// Use case for running one deliberation session
pub struct DeliberationSession {
    deps: SessionDeps,
    cancel: Option<CancellationToken>,
}

impl DeliberationSession {
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps, cancel: None }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the session to completion.
    ///
    /// `approve_execution` is the human-approval flag from the front-end; it
    /// only matters when the leader summary declares the outcome executable.
    pub async fn run(
        &self,
        human_prompt: &str,
        approve_execution: bool,
    ) -> Result<SessionOutcome, SessionError> {
        let config = &self.deps.config;
        self.preflight(config)?;

        let session_id = self.deps.ids.session_id();
        info!(session = %session_id, council = %config.council_name, "session starting");

        self.deps.memory.prepare(config).await?;
        let mut scribe = EventScribe::new(
            session_id.clone(),
            Arc::clone(&self.deps.recorder),
            Arc::clone(&self.deps.clock),
        );
        let mut state = SessionState::new();

        scribe
            .emit(
                EventKind::SessionStarted,
                PhaseState::Discussion,
                0,
                None,
                json!({
                    "councilName": &config.council_name,
                    "purpose": &config.purpose,
                    "humanPrompt": human_prompt,
                    "members": config.member_ids(),
                }),
            )
            .await?;

        // 1. Leader election.
        let leader_id = elect_leader(
            config,
            &self.deps.clients,
            &mut scribe,
            human_prompt,
            &self.cancel,
            &mut state.parse_fallback_members,
        )
        .await?;

        // 2. Phase sequencing through the transition resolver, bounded by
        //    maxPhaseTransitions so a cyclic graph cannot spin forever.
        let runner = PhaseRunner {
            config,
            clients: &self.deps.clients,
            memory: &self.deps.memory,
            ids: &self.deps.ids,
            cancel: &self.cancel,
        };

        let mut phase_results: Vec<PhaseResult> = Vec::new();
        let mut current = config.session.entry_phase_id.clone();
        let max_phases = config.session.max_phase_transitions;
        let session_ended_by;

        loop {
            let phase = config
                .phase(&current)
                .unwrap_or_else(|| panic!("unknown phase '{current}'"));
            let result = runner
                .run(&mut scribe, &mut state, human_prompt, phase, &phase_results)
                .await?;
            let next = resolve_transition(phase, result.ended_by).map(str::to_string);
            let ended_by = result.ended_by;
            phase_results.push(result);

            match next {
                Some(next_id) if (phase_results.len() as u32) < max_phases => {
                    scribe
                        .emit(
                            EventKind::PhaseTransition,
                            PhaseState::Discussion,
                            0,
                            None,
                            json!({"from": &current, "to": &next_id}),
                        )
                        .await?;
                    current = next_id;
                }
                Some(next_id) => {
                    // The graph wants to continue but the global budget is
                    // spent; terminate with a synthetic round-limit outcome.
                    warn!(from = %current, skipped = %next_id, "phase budget exhausted; forcing termination");
                    scribe
                        .emit(
                            EventKind::PhaseTransition,
                            PhaseState::Discussion,
                            0,
                            None,
                            json!({
                                "from": &current,
                                "to": serde_json::Value::Null,
                                "stopReason": format!(
                                    "maxPhaseTransitions ({max_phases}) exhausted"
                                ),
                            }),
                        )
                        .await?;
                    session_ended_by = EndedBy::RoundLimit;
                    break;
                }
                None => {
                    session_ended_by = ended_by;
                    break;
                }
            }
        }

        let final_resolution = phase_results
            .last()
            .map(|r| r.final_resolution.clone())
            .unwrap_or_default();

        // 3. Leader summary.
        check_cancelled(&self.cancel)?;
        let leader_summary = self
            .leader_summary(&mut scribe, &leader_id, human_prompt, &phase_results, &final_resolution)
            .await?;
        let mut artifacts = vec!["leader-summary.md".to_string()];

        // 4. Documentation loop, only when configured.
        let documentation_approved = if config.output == OutputType::Documentation {
            let doc_loop = DocumentationLoop {
                config,
                clients: &self.deps.clients,
                recorder: &self.deps.recorder,
                cancel: &self.cancel,
            };
            let outcome = doc_loop
                .run(
                    &mut scribe,
                    &mut state,
                    &leader_id,
                    human_prompt,
                    &leader_summary.final_resolution,
                    &phase_results,
                )
                .await?;
            artifacts.extend(outcome.artifacts);
            Some(outcome.approved)
        } else {
            None
        };

        // 5. Execution handoff, gated by config + the CLI flag.
        let handoff = if leader_summary.requires_execution
            && let Some(brief) = leader_summary.execution_brief.clone()
        {
            let approval_required = config.execution.require_human_approval;
            let handoff = ExecutionHandoff {
                session_id: session_id.clone(),
                approved: !approval_required || approve_execution,
                approval_required,
                default_executor_profile: config.execution.default_executor_profile.clone(),
                motion_id: phase_results
                    .iter()
                    .rev()
                    .find_map(|r| r.winning_motion.as_ref())
                    .map(|m| m.motion_id.clone()),
                leader_id: leader_id.clone(),
                execution_brief: brief,
            };
            let body = serde_json::to_string_pretty(&handoff)
                .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
            self.deps
                .recorder
                .write_artifact("execution-handoff.json", &body)
                .await?;
            artifacts.push("execution-handoff.json".to_string());
            info!(approved = handoff.approved, "execution handoff written");
            Some(handoff)
        } else {
            None
        };

        // 6. Finalize.
        scribe
            .emit(
                EventKind::SessionClosed,
                PhaseState::Discussion,
                0,
                None,
                json!({
                    "endedBy": session_ended_by,
                    "finalResolution": &leader_summary.final_resolution,
                }),
            )
            .await?;

        if self.memory_writes_enabled(config, &phase_results) {
            let input = SessionMemoryInput {
                session_id: session_id.clone(),
                timestamp: self.deps.clock.now_rfc3339(),
                final_resolution: leader_summary.final_resolution.clone(),
                member_ids: config.members.iter().map(|m| m.id.clone()).collect(),
                last_contributions: state.last_contributions.clone(),
                parse_fallback_members: state.parse_fallback_members.clone(),
                ended_by_round_limit: session_ended_by == EndedBy::RoundLimit,
                requires_execution: leader_summary.requires_execution,
                execution_approved: handoff.as_ref().map(|h| h.approved),
            };
            self.deps.memory.record_session(&input).await?;
        }

        let state_doc = SessionStateDoc {
            session_id: session_id.clone(),
            leader_id: leader_id.clone(),
            human_prompt: human_prompt.to_string(),
            phase_results: phase_results.clone(),
            ended_by: session_ended_by,
            final_resolution: leader_summary.final_resolution.clone(),
            documentation_approved,
            execution_approved: handoff.as_ref().map(|h| h.approved),
            artifacts,
        };
        self.deps.recorder.finalize(&state_doc).await?;
        info!(session = %session_id, "session closed");

        Ok(SessionOutcome {
            session_id,
            leader_id,
            ended_by: session_ended_by,
            final_resolution: leader_summary.final_resolution.clone(),
            phase_results,
            leader_summary,
            documentation_approved,
            handoff,
        })
    }

    /// Config and wiring checks; nothing may have touched storage yet.
    fn preflight(&self, config: &CouncilConfig) -> Result<(), SessionError> {
        let fatal: Vec<String> = config
            .validate()
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.message)
            .collect();
        if !fatal.is_empty() {
            return Err(SessionError::InvalidConfig(fatal.join("; ")));
        }
        for member in &config.members {
            if !self.deps.clients.contains_key(&member.id) {
                return Err(SessionError::MissingClient(member.id.clone()));
            }
        }
        Ok(())
    }

    async fn leader_summary(
        &self,
        scribe: &mut EventScribe,
        leader_id: &str,
        human_prompt: &str,
        phase_results: &[PhaseResult],
        final_resolution: &str,
    ) -> Result<conclave_domain::LeaderSummary, SessionError> {
        let config = &self.deps.config;
        let leader = config
            .member(leader_id)
            .unwrap_or_else(|| panic!("unknown leader '{leader_id}'"));
        let client = client_for(&self.deps.clients, leader_id)?;

        let reply = client
            .complete_json(
                &PromptTemplate::member_system(config, leader),
                &PromptTemplate::leader_summary(human_prompt, phase_results, final_resolution),
                &options_for(leader),
            )
            .await?;
        if let JsonReply::ParseError { message, .. } = &reply {
            warn!(leader = %leader_id, error = %message, "leader summary unparseable; using fallback");
        }
        let summary = normalize::leader_summary(&reply, final_resolution);

        self.deps
            .recorder
            .write_artifact("leader-summary.md", &summary.summary_markdown)
            .await?;
        scribe
            .emit(
                EventKind::LeaderSummaryRecorded,
                PhaseState::Discussion,
                0,
                Some(leader_id),
                json!({
                    "finalResolution": &summary.final_resolution,
                    "requiresExecution": summary.requires_execution,
                }),
            )
            .await?;
        Ok(summary)
    }

    /// Memory writes are all-or-nothing at session close: they happen iff
    /// any completed phase's policy enables member or council writes.
    fn memory_writes_enabled(&self, config: &CouncilConfig, results: &[PhaseResult]) -> bool {
        results.iter().any(|result| {
            config
                .phase(&result.phase_id)
                .map(|p| p.memory_policy.write_member_memory || p.memory_policy.write_council_memory)
                .unwrap_or(false)
        })
    }
}

//! Phase runner
//!
//! Drives one phase of the deliberation graph: the round-robin turn loop
//! and, when a member calls a vote, the motion sub-machine (seconding fan-out
//! over the non-callers, blind ballot fan-out over the whole council, tally).
//!
//! Turn actions are strictly sequential: a contribution is logged before
//! the next speaker's prompt is built, so every member sees the updated
//! transcript. The two fan-outs inside a motion are joined before any of
//! their events are emitted, and their events always go out in member turn
//! order, never arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use conclave_domain::{
    Ballot, CouncilConfig, EndedBy, EventKind, Member, Motion, Phase, PhaseContextPacket,
    PhaseResult, PhaseState, PromptTemplate, TallyOutcome, TranscriptEntry, normalize, tally,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::SessionError;
use super::fan_out::{JsonCall, check_cancelled, collect_json_replies};
use super::scribe::EventScribe;
use super::{SessionState, client_for, options_for};
use crate::ports::clock::IdGenerator;
use crate::ports::memory_store::MemoryStore;
use crate::ports::model_client::ModelClient;

/// Speaker name used for procedural transcript lines
const PROCEDURE_SPEAKER: &str = "council";

pub(crate) struct PhaseRunner<'a> {
    pub config: &'a CouncilConfig,
    pub clients: &'a HashMap<String, Arc<dyn ModelClient>>,
    pub memory: &'a Arc<dyn MemoryStore>,
    pub ids: &'a Arc<dyn IdGenerator>,
    pub cancel: &'a Option<CancellationToken>,
}

enum MotionFate {
    NotSeconded,
    Voted(TallyOutcome),
}

impl PhaseRunner<'_> {
    pub async fn run(
        &self,
        scribe: &mut EventScribe,
        state: &mut SessionState,
        human_prompt: &str,
        phase: &Phase,
        prior_results: &[PhaseResult],
    ) -> Result<PhaseResult, SessionError> {
        info!(phase = %phase.id, goal = %phase.goal, "phase started");
        scribe
            .emit(
                EventKind::PhaseStarted,
                PhaseState::Discussion,
                0,
                None,
                json!({"phaseId": &phase.id, "goal": &phase.goal}),
            )
            .await?;

        let order = self.config.speaking_order();
        let max_rounds = phase.stop_conditions.max_rounds;

        for round in 1..=max_rounds {
            scribe
                .emit(
                    EventKind::RoundStarted,
                    PhaseState::Discussion,
                    round,
                    None,
                    json!({"round": round, "maxRounds": max_rounds}),
                )
                .await?;

            for speaker in &order {
                check_cancelled(self.cancel)?;
                let turn_index = scribe.begin_turn();
                debug!(phase = %phase.id, round, turn_index, speaker = %speaker.id, "turn");

                let action = self
                    .take_turn(state, human_prompt, phase, round, speaker, prior_results)
                    .await?;
                scribe
                    .emit(
                        EventKind::TurnAction,
                        PhaseState::Discussion,
                        round,
                        Some(&speaker.id),
                        serde_json::to_value(&action).unwrap_or_default(),
                    )
                    .await?;

                match action {
                    conclave_domain::TurnAction::Contribute { message } => {
                        scribe
                            .emit(
                                EventKind::MessageContributed,
                                PhaseState::Discussion,
                                round,
                                Some(&speaker.id),
                                json!({"message": &message}),
                            )
                            .await?;
                        state.transcript.push(TranscriptEntry {
                            phase_id: phase.id.clone(),
                            round,
                            speaker: speaker.id.clone(),
                            text: message.clone(),
                        });
                        state
                            .last_contributions
                            .insert(speaker.id.clone(), message);
                    }
                    conclave_domain::TurnAction::Pass { reason, note } => {
                        scribe
                            .emit(
                                EventKind::PassRecorded,
                                PhaseState::Discussion,
                                round,
                                Some(&speaker.id),
                                json!({"reason": reason, "note": note}),
                            )
                            .await?;
                    }
                    conclave_domain::TurnAction::CallVote {
                        title,
                        text,
                        decision_if_pass,
                    } => {
                        let motion = Motion {
                            motion_id: self.ids.motion_id(),
                            title,
                            text,
                            decision_if_pass,
                            proposer: speaker.id.clone(),
                            round,
                            turn_index,
                        };
                        scribe
                            .emit(
                                EventKind::MotionCalled,
                                PhaseState::Discussion,
                                round,
                                Some(&speaker.id),
                                serde_json::to_value(&motion).unwrap_or_default(),
                            )
                            .await?;

                        let fate = self.run_motion(scribe, state, phase, &motion, &order).await?;
                        if let MotionFate::Voted(outcome) = fate
                            && outcome.passed
                            && phase.stop_conditions.end_on_majority_vote
                        {
                            let result = PhaseResult {
                                phase_id: phase.id.clone(),
                                phase_goal: phase.goal.clone(),
                                ended_by: EndedBy::MajorityVote,
                                final_resolution: motion.decision_if_pass.clone(),
                                winning_motion: Some(motion),
                                rounds_completed: round,
                            };
                            scribe
                                .emit(
                                    EventKind::PhaseCompleted,
                                    PhaseState::Discussion,
                                    round,
                                    None,
                                    json!({
                                        "endedBy": result.ended_by,
                                        "finalResolution": &result.final_resolution,
                                    }),
                                )
                                .await?;
                            info!(phase = %phase.id, "phase closed on passing motion");
                            return Ok(result);
                        }
                    }
                }
            }
        }

        // Round limit exhausted without a passing motion.
        scribe
            .emit(
                EventKind::RoundLimitReached,
                PhaseState::Discussion,
                max_rounds,
                None,
                json!({
                    "maxRounds": max_rounds,
                    "fallback": &phase.fallback,
                }),
            )
            .await?;

        let result = PhaseResult {
            phase_id: phase.id.clone(),
            phase_goal: phase.goal.clone(),
            ended_by: EndedBy::RoundLimit,
            final_resolution: phase.fallback.resolution.clone(),
            winning_motion: None,
            rounds_completed: max_rounds,
        };
        scribe
            .emit(
                EventKind::PhaseCompleted,
                PhaseState::Discussion,
                max_rounds,
                None,
                json!({
                    "endedBy": result.ended_by,
                    "finalResolution": &result.final_resolution,
                }),
            )
            .await?;
        info!(phase = %phase.id, "phase ended at round limit");
        Ok(result)
    }

    /// One member's turn: prompt, call, normalize.
    async fn take_turn(
        &self,
        state: &mut SessionState,
        human_prompt: &str,
        phase: &Phase,
        round: u32,
        speaker: &Member,
        prior_results: &[PhaseResult],
    ) -> Result<conclave_domain::TurnAction, SessionError> {
        let memory_context = if phase.memory_policy.read_member_memory {
            self.memory.member_context(&speaker.id).await?
        } else {
            None
        };

        let verbosity = self.config.session.phase_context_verbosity;
        let packet = PhaseContextPacket::build(phase, round, &self.config.phases, verbosity);
        let mut context = packet.render(verbosity);
        if phase.memory_policy.include_prior_phase_summary && !prior_results.is_empty() {
            context.push_str("\nEarlier phases:");
            for prior in prior_results {
                context.push_str(&format!(
                    "\n- {} ({}): {}",
                    prior.phase_id, prior.ended_by, prior.final_resolution
                ));
            }
        }
        let prompt = PromptTemplate::turn(
            human_prompt,
            &context,
            &phase.prompt_guidance,
            round,
            phase.stop_conditions.max_rounds,
            &state.transcript,
            memory_context.as_ref(),
        );

        let client = client_for(self.clients, &speaker.id)?;
        let system = PromptTemplate::member_system(self.config, speaker);
        let reply = client
            .complete_json(&system, &prompt, &options_for(speaker))
            .await?;

        if reply.is_parse_error() {
            warn!(member = %speaker.id, round, "turn reply unparseable; degrading to PASS");
            state.parse_fallback_members.insert(speaker.id.clone());
        }
        Ok(normalize::turn_action(&reply))
    }

    /// The motion sub-machine: seconding, blind vote, tally.
    ///
    /// Atomic from the phase's perspective: it runs entirely inside the
    /// proposer's turn.
    async fn run_motion(
        &self,
        scribe: &mut EventScribe,
        state: &mut SessionState,
        phase: &Phase,
        motion: &Motion,
        order: &[&Member],
    ) -> Result<MotionFate, SessionError> {
        let round = motion.round;

        if phase.governance.require_seconding {
            let non_callers: Vec<&Member> = order
                .iter()
                .filter(|m| m.id != motion.proposer)
                .copied()
                .collect();

            let prompt = PromptTemplate::seconding(motion, &state.transcript);
            let mut calls = Vec::with_capacity(non_callers.len());
            for member in &non_callers {
                calls.push(JsonCall {
                    member_id: member.id.clone(),
                    client: Arc::clone(client_for(self.clients, &member.id)?),
                    system_prompt: PromptTemplate::member_system(self.config, member),
                    user_prompt: prompt.clone(),
                    options: options_for(member),
                });
            }
            let replies = collect_json_replies(calls, self.cancel).await?;

            // Responses are emitted in non-caller turn order; the seconder is
            // the first of them that agreed.
            let mut seconder: Option<String> = None;
            for member in &non_callers {
                let reply = replies
                    .get(&member.id)
                    .unwrap_or_else(|| panic!("missing seconding reply for member '{}'", member.id));
                if reply.is_parse_error() {
                    state.parse_fallback_members.insert(member.id.clone());
                }
                let response = normalize::seconding(reply);
                if response.second && seconder.is_none() {
                    seconder = Some(member.id.clone());
                }
                scribe
                    .emit(
                        EventKind::SecondingResponse,
                        PhaseState::Seconding,
                        round,
                        Some(&member.id),
                        json!({
                            "motionId": &motion.motion_id,
                            "second": response.second,
                            "rationale": response.rationale,
                        }),
                    )
                    .await?;
            }

            let Some(seconder) = seconder else {
                scribe
                    .emit(
                        EventKind::MotionNotSeconded,
                        PhaseState::Seconding,
                        round,
                        None,
                        json!({"motionId": &motion.motion_id}),
                    )
                    .await?;
                state.transcript.push(TranscriptEntry {
                    phase_id: phase.id.clone(),
                    round,
                    speaker: PROCEDURE_SPEAKER.to_string(),
                    text: format!(
                        "Motion \"{}\" by {} found no seconder and was dropped.",
                        motion.title, motion.proposer
                    ),
                });
                info!(motion = %motion.motion_id, "motion not seconded");
                return Ok(MotionFate::NotSeconded);
            };

            scribe
                .emit(
                    EventKind::MotionSeconded,
                    PhaseState::Seconding,
                    round,
                    Some(&seconder),
                    json!({"motionId": &motion.motion_id, "secondedBy": &seconder}),
                )
                .await?;
        }

        // Blind vote: every member (including the caller) votes in parallel,
        // and nothing is emitted until all ballots are in.
        let prompt = PromptTemplate::vote(motion, &state.transcript);
        let mut calls = Vec::with_capacity(order.len());
        for member in order {
            calls.push(JsonCall {
                member_id: member.id.clone(),
                client: Arc::clone(client_for(self.clients, &member.id)?),
                system_prompt: PromptTemplate::member_system(self.config, member),
                user_prompt: prompt.clone(),
                options: options_for(member),
            });
        }
        let replies = collect_json_replies(calls, self.cancel).await?;

        let mut ballots = Vec::with_capacity(order.len());
        for member in order {
            let reply = replies
                .get(&member.id)
                .unwrap_or_else(|| panic!("missing vote reply for member '{}'", member.id));
            if reply.is_parse_error() {
                state.parse_fallback_members.insert(member.id.clone());
            }
            let vote = normalize::vote(reply);
            ballots.push(Ballot::new(member.id.clone(), vote.ballot, vote.rationale));
        }

        for ballot in &ballots {
            scribe
                .emit(
                    EventKind::VoteCast,
                    PhaseState::Voting,
                    round,
                    Some(&ballot.voter),
                    json!({
                        "motionId": &motion.motion_id,
                        "ballot": ballot.choice,
                        "rationale": &ballot.rationale,
                    }),
                )
                .await?;
        }

        let outcome = tally(&ballots, &phase.governance, self.config.council_size());
        scribe
            .emit(
                EventKind::VoteResult,
                PhaseState::Voting,
                round,
                None,
                json!({
                    "motionId": &motion.motion_id,
                    "passed": outcome.passed,
                    "yesVotes": outcome.yes_votes,
                    "noVotesEffective": outcome.no_votes_effective,
                    "totalCouncilSize": outcome.total_council_size,
                    "requiredYes": outcome.required_yes,
                    "majorityThreshold": outcome.majority_threshold,
                }),
            )
            .await?;

        state.transcript.push(TranscriptEntry {
            phase_id: phase.id.clone(),
            round,
            speaker: PROCEDURE_SPEAKER.to_string(),
            text: PromptTemplate::vote_result_line(motion, &outcome),
        });
        info!(motion = %motion.motion_id, passed = outcome.passed, yes = outcome.yes_votes, "vote resolved");

        Ok(MotionFate::Voted(outcome))
    }
}

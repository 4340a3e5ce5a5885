//! Documentation review loop
//!
//! Bounded draft -> approval-vote -> feedback -> revise cycle. With R
//! revision rounds configured there are R+1 draft attempts in total. The
//! approval vote runs over the full council at the 0.5 threshold with
//! abstentions counting as NO. Feedback is collected only from members who
//! did not vote YES.

use std::collections::HashMap;
use std::sync::Arc;

use conclave_domain::{
    Ballot, BallotChoice, CouncilConfig, EventKind, Governance, PhaseResult, PhaseState,
    PromptTemplate, ReviewFeedback, tally,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::SessionError;
use super::fan_out::{JsonCall, collect_json_replies};
use super::scribe::EventScribe;
use super::{SessionState, client_for, options_for};
use crate::ports::model_client::ModelClient;
use crate::ports::recorder::SessionRecorder;

/// Approval votes always run under this governance, regardless of any
/// phase's configuration.
fn approval_governance() -> Governance {
    Governance {
        require_seconding: false,
        majority_threshold: 0.5,
        abstain_counts_as_no: true,
    }
}

pub(crate) struct DocumentationOutcome {
    pub approved: bool,
    /// Artifact names written under the session directory
    pub artifacts: Vec<String>,
}

pub(crate) struct DocumentationLoop<'a> {
    pub config: &'a CouncilConfig,
    pub clients: &'a HashMap<String, Arc<dyn ModelClient>>,
    pub recorder: &'a Arc<dyn SessionRecorder>,
    pub cancel: &'a Option<CancellationToken>,
}

impl DocumentationLoop<'_> {
    pub async fn run(
        &self,
        scribe: &mut EventScribe,
        state: &mut SessionState,
        leader_id: &str,
        human_prompt: &str,
        final_resolution: &str,
        phase_results: &[PhaseResult],
    ) -> Result<DocumentationOutcome, SessionError> {
        let leader = self
            .config
            .member(leader_id)
            .unwrap_or_else(|| panic!("unknown leader '{leader_id}'"));
        let leader_client = client_for(self.clients, leader_id)?;
        let leader_system = PromptTemplate::member_system(self.config, leader);

        let max_revisions = self.config.documentation_review.max_revision_rounds;
        let mut artifacts = Vec::new();

        info!(leader = %leader_id, max_revisions, "documentation loop started");
        let mut draft = leader_client
            .complete_text(
                &leader_system,
                &PromptTemplate::documentation_draft(human_prompt, final_resolution, phase_results),
                &options_for(leader),
            )
            .await?;

        let mut last_feedback: Vec<ReviewFeedback> = Vec::new();

        for revision in 1..=max_revisions + 1 {
            let draft_name = format!("documentation.draft.v{revision}.md");
            self.recorder.write_artifact(&draft_name, &draft).await?;
            artifacts.push(draft_name.clone());

            let kind = if revision == 1 {
                EventKind::DocumentDraftWritten
            } else {
                EventKind::DocumentRevisionWritten
            };
            scribe
                .emit(
                    kind,
                    PhaseState::Discussion,
                    revision,
                    Some(leader_id),
                    json!({"revision": revision, "artifact": draft_name}),
                )
                .await?;

            let ballots = self.approval_vote(scribe, revision, &draft).await?;
            let outcome = tally(&ballots, &approval_governance(), self.config.council_size());
            scribe
                .emit(
                    EventKind::DocumentApprovalVoteResult,
                    PhaseState::Voting,
                    revision,
                    None,
                    json!({
                        "revision": revision,
                        "passed": outcome.passed,
                        "yesVotes": outcome.yes_votes,
                        "noVotesEffective": outcome.no_votes_effective,
                        "totalCouncilSize": outcome.total_council_size,
                        "ballots": &ballots,
                    }),
                )
                .await?;

            if outcome.passed {
                self.recorder.write_artifact("documentation.md", &draft).await?;
                artifacts.push("documentation.md".to_string());
                info!(revision, "documentation approved");
                return Ok(DocumentationOutcome {
                    approved: true,
                    artifacts,
                });
            }

            if revision == max_revisions + 1 {
                break;
            }

            // Gather structured feedback from everyone who withheld a YES.
            let feedback = self.collect_feedback(state, &ballots, &draft).await?;
            let feedback_json = serde_json::to_string_pretty(&feedback)
                .unwrap_or_else(|_| "[]".to_string());
            let review_name = format!("documentation.review.v{revision}.json");
            self.recorder.write_artifact(&review_name, &feedback_json).await?;
            artifacts.push(review_name);

            let blocker_count: usize =
                feedback.iter().map(|f| f.critical_blockers.len()).sum();
            scribe
                .emit(
                    EventKind::DocumentFeedbackCollected,
                    PhaseState::Discussion,
                    revision,
                    None,
                    json!({
                        "revision": revision,
                        "reviewers": feedback.iter().map(|f| f.reviewer.clone()).collect::<Vec<_>>(),
                        "blockerCount": blocker_count,
                    }),
                )
                .await?;
            last_feedback = feedback;

            draft = leader_client
                .complete_text(
                    &leader_system,
                    &PromptTemplate::documentation_revision(&draft, &feedback_json),
                    &options_for(leader),
                )
                .await?;
        }

        // Exhausted: persist the unapproved draft and what still blocks it.
        warn!("documentation not approved within the revision bound");
        self.recorder
            .write_artifact("documentation.unapproved.md", &draft)
            .await?;
        artifacts.push("documentation.unapproved.md".to_string());

        let blockers: Vec<_> = last_feedback
            .iter()
            .flat_map(|f| f.critical_blockers.iter())
            .collect();
        let blockers_json =
            serde_json::to_string_pretty(&blockers).unwrap_or_else(|_| "[]".to_string());
        self.recorder
            .write_artifact("documentation.unresolved-blockers.json", &blockers_json)
            .await?;
        artifacts.push("documentation.unresolved-blockers.json".to_string());

        Ok(DocumentationOutcome {
            approved: false,
            artifacts,
        })
    }

    /// Blind approval vote over the full council.
    async fn approval_vote(
        &self,
        scribe: &mut EventScribe,
        revision: u32,
        draft: &str,
    ) -> Result<Vec<Ballot>, SessionError> {
        scribe
            .emit(
                EventKind::DocumentApprovalVoteCalled,
                PhaseState::Voting,
                revision,
                None,
                json!({"revision": revision}),
            )
            .await?;

        let prompt = PromptTemplate::documentation_approval(draft, revision);
        let order = self.config.speaking_order();
        let mut calls = Vec::with_capacity(order.len());
        for member in &order {
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
        for member in &order {
            let reply = replies
                .get(&member.id)
                .unwrap_or_else(|| panic!("missing approval reply for member '{}'", member.id));
            let vote = conclave_domain::normalize::vote(reply);
            ballots.push(Ballot::new(member.id.clone(), vote.ballot, vote.rationale));
        }
        Ok(ballots)
    }

    /// Fan out feedback prompts to every non-YES voter.
    async fn collect_feedback(
        &self,
        state: &mut SessionState,
        ballots: &[Ballot],
        draft: &str,
    ) -> Result<Vec<ReviewFeedback>, SessionError> {
        let dissenters: Vec<&str> = ballots
            .iter()
            .filter(|b| b.choice != BallotChoice::Yes)
            .map(|b| b.voter.as_str())
            .collect();

        let prompt = PromptTemplate::documentation_feedback(draft);
        let mut calls = Vec::with_capacity(dissenters.len());
        for member_id in &dissenters {
            let member = self
                .config
                .member(member_id)
                .unwrap_or_else(|| panic!("unknown member '{member_id}'"));
            calls.push(JsonCall {
                member_id: member.id.clone(),
                client: Arc::clone(client_for(self.clients, member_id)?),
                system_prompt: PromptTemplate::member_system(self.config, member),
                user_prompt: prompt.clone(),
                options: options_for(member),
            });
        }
        let replies = collect_json_replies(calls, self.cancel).await?;

        let mut feedback = Vec::with_capacity(dissenters.len());
        for member_id in &dissenters {
            let reply = replies
                .get(*member_id)
                .unwrap_or_else(|| panic!("missing feedback reply for member '{member_id}'"));
            if reply.is_parse_error() {
                state.parse_fallback_members.insert((*member_id).to_string());
            }
            feedback.push(ReviewFeedback::from_reply(member_id, reply));
        }
        Ok(feedback)
    }
}

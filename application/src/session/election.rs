//! Leader election
//!
//! One ballot per member, collected in parallel and joined before any ballot
//! event is emitted. The tally is deterministic: the highest count wins and
//! ties break to the lexicographically smallest member id.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use conclave_domain::{CouncilConfig, EventKind, PhaseState, PromptTemplate, normalize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::error::SessionError;
use super::fan_out::{JsonCall, collect_json_replies};
use super::scribe::EventScribe;
use super::{client_for, options_for};
use crate::ports::model_client::ModelClient;

pub(crate) async fn elect_leader(
    config: &CouncilConfig,
    clients: &HashMap<String, Arc<dyn ModelClient>>,
    scribe: &mut EventScribe,
    human_prompt: &str,
    cancel: &Option<CancellationToken>,
    parse_fallback_members: &mut BTreeSet<String>,
) -> Result<String, SessionError> {
    let prompt = PromptTemplate::leader_election(config, human_prompt);

    let mut calls = Vec::with_capacity(config.members.len());
    for member in &config.members {
        calls.push(JsonCall {
            member_id: member.id.clone(),
            client: Arc::clone(client_for(clients, &member.id)?),
            system_prompt: PromptTemplate::member_system(config, member),
            user_prompt: prompt.clone(),
            options: options_for(member),
        });
    }

    let replies = collect_json_replies(calls, cancel).await?;

    let member_ids = config.member_ids();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    // Ballot events go out in declaration order, never arrival order.
    for member in &config.members {
        let reply = replies
            .get(&member.id)
            .unwrap_or_else(|| panic!("missing election reply for member '{}'", member.id));
        if reply.is_parse_error() {
            parse_fallback_members.insert(member.id.clone());
        }
        let ballot = normalize::election(reply, &member_ids);
        *counts.entry(ballot.candidate_id.clone()).or_default() += 1;

        scribe
            .emit(
                EventKind::LeaderElectionBallot,
                PhaseState::Discussion,
                0,
                Some(&member.id),
                json!({
                    "candidateId": &ballot.candidate_id,
                    "rationale": &ballot.rationale,
                }),
            )
            .await?;
    }

    // BTreeMap iterates ids ascending, so a strict > keeps the smallest id
    // among equal counts.
    let mut leader_id = member_ids[0].to_string();
    let mut best = 0usize;
    for (candidate, count) in &counts {
        if *count > best {
            best = *count;
            leader_id = candidate.clone();
        }
    }

    info!(leader = %leader_id, votes = best, "leader elected");
    scribe
        .emit(
            EventKind::LeaderElected,
            PhaseState::Discussion,
            0,
            Some(&leader_id),
            json!({
                "leaderId": &leader_id,
                "voteCounts": &counts,
            }),
        )
        .await?;

    Ok(leader_id)
}

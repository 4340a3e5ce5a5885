//! Prompt templates for the deliberation protocol
//!
//! Pure string builders; no I/O. Every JSON-mode prompt ends with the same
//! single-line mandate and the hard-length table so normalization stays
//! predictable across members and models.

use crate::ballot::TallyOutcome;
use crate::council::config::{CouncilConfig, Member};
use crate::memory::document::PromptContext;
use crate::motion::Motion;
use crate::protocol::limits;
use crate::session::{PhaseResult, TranscriptEntry};

/// How many trailing transcript entries a turn prompt carries
pub const TRANSCRIPT_WINDOW: usize = 12;

/// Templates for generating prompts at each protocol step
pub struct PromptTemplate;

impl PromptTemplate {
    /// Mandate appended to every JSON-mode prompt
    fn json_mandate(schema: &str) -> String {
        format!(
            "{}\n\nRespond with exactly one line of JSON matching this shape:\n{}\n\
             Do not wrap the JSON in markdown. Do not add commentary. \
             Never put a literal newline inside a string value; use \\n instead.",
            limits::render_table(),
            schema
        )
    }

    /// System prompt for a member: council identity plus persona.
    pub fn member_system(config: &CouncilConfig, member: &Member) -> String {
        let mut out = format!(
            "You are {} ({}), a member of the council \"{}\".\n\
             Council purpose: {}\n\nYour role: {}\n",
            member.name, member.id, config.council_name, config.purpose, member.role
        );
        if !member.traits.is_empty() {
            out.push_str(&format!("Your traits: {}\n", member.traits.join(", ")));
        }
        if !member.focus_weights.is_empty() {
            let focus: Vec<String> = member
                .focus_weights
                .iter()
                .map(|(topic, weight)| format!("{topic} ({weight:.1})"))
                .collect();
            out.push_str(&format!("You weigh these concerns: {}\n", focus.join(", ")));
        }
        out.push('\n');
        out.push_str(&member.system_prompt);
        out
    }

    fn transcript_window(transcript: &[TranscriptEntry]) -> String {
        if transcript.is_empty() {
            return "The discussion has not started yet.".to_string();
        }
        let start = transcript.len().saturating_sub(TRANSCRIPT_WINDOW);
        transcript[start..]
            .iter()
            .map(|entry| format!("[round {}] {}: {}", entry.round, entry.speaker, entry.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn memory_section(memory: Option<&PromptContext>) -> String {
        match memory {
            Some(context) if !context.is_empty() => {
                format!("What you remember from past sessions:\n{}\n\n", context.render())
            }
            _ => String::new(),
        }
    }

    /// Prompt for one discussion turn.
    pub fn turn(
        human_prompt: &str,
        phase_context: &str,
        guidance: &[String],
        round: u32,
        max_rounds: u32,
        transcript: &[TranscriptEntry],
        memory: Option<&PromptContext>,
    ) -> String {
        let remaining = max_rounds.saturating_sub(round) + 1;
        let guidance_block = if guidance.is_empty() {
            String::new()
        } else {
            format!("Guidance for this phase:\n- {}\n\n", guidance.join("\n- "))
        };

        format!(
            "The council is deliberating on:\n{human_prompt}\n\n\
             {phase_context}\n\n\
             {guidance_block}\
             {memory}\
             Recent discussion:\n{transcript}\n\n\
             It is your turn to speak. Including this one, you have {remaining} turn(s) left \
             in this phase. You may CONTRIBUTE a message, PASS, or CALL_VOTE to put a motion \
             on the floor.\n\n{mandate}",
            memory = Self::memory_section(memory),
            transcript = Self::transcript_window(transcript),
            mandate = Self::json_mandate(
                r#"{"action": "CONTRIBUTE", "message": "..."} | {"action": "PASS", "reason": "...", "note": "..."} | {"action": "CALL_VOTE", "title": "...", "text": "...", "decisionIfPass": "..."}"#
            ),
        )
    }

    /// Prompt asking a non-caller whether to second a motion.
    pub fn seconding(motion: &Motion, transcript: &[TranscriptEntry]) -> String {
        format!(
            "{proposer} has called a vote on the motion \"{title}\":\n{text}\n\n\
             If it passes, the council adopts: {decision}\n\n\
             Recent discussion:\n{transcript}\n\n\
             Will you second this motion so it goes to a vote? Seconding is not a YES vote; \
             it only means the motion deserves a decision now.\n\n{mandate}",
            proposer = motion.proposer,
            title = motion.title,
            text = motion.text,
            decision = motion.decision_if_pass,
            transcript = Self::transcript_window(transcript),
            mandate = Self::json_mandate(r#"{"second": true|false, "rationale": "..."}"#),
        )
    }

    /// Prompt for a blind ballot on a seconded motion.
    pub fn vote(motion: &Motion, transcript: &[TranscriptEntry]) -> String {
        format!(
            "The motion \"{title}\" (called by {proposer}, seconded) is now up for a blind \
             vote:\n{text}\n\n\
             If it passes, the council adopts: {decision}\n\n\
             Recent discussion:\n{transcript}\n\n\
             Cast your ballot. You will not see the other ballots until all are in.\n\n{mandate}",
            title = motion.title,
            proposer = motion.proposer,
            text = motion.text,
            decision = motion.decision_if_pass,
            transcript = Self::transcript_window(transcript),
            mandate = Self::json_mandate(r#"{"ballot": "YES"|"NO"|"ABSTAIN", "rationale": "..."}"#),
        )
    }

    /// Prompt for the leader election at session start.
    pub fn leader_election(config: &CouncilConfig, human_prompt: &str) -> String {
        let roster: Vec<String> = config
            .members
            .iter()
            .map(|m| format!("{} — {}", m.id, m.role))
            .collect();
        format!(
            "The council \"{name}\" is convening to deliberate on:\n{human_prompt}\n\n\
             Before discussion starts, elect a leader to keep order and write the closing \
             summary. Candidates (you may vote for yourself):\n{roster}\n\n{mandate}",
            name = config.council_name,
            roster = roster.join("\n"),
            mandate = Self::json_mandate(r#"{"candidateId": "...", "rationale": "..."}"#),
        )
    }

    /// Prompt for the leader's closing summary.
    pub fn leader_summary(
        human_prompt: &str,
        phase_results: &[PhaseResult],
        final_resolution: &str,
    ) -> String {
        let phases: Vec<String> = phase_results
            .iter()
            .map(|r| {
                format!(
                    "- {} ({}): ended by {}, resolution: {}",
                    r.phase_id, r.phase_goal, r.ended_by, r.final_resolution
                )
            })
            .collect();
        format!(
            "The deliberation on the following prompt has concluded:\n{human_prompt}\n\n\
             Phase outcomes:\n{phases}\n\n\
             Final resolution: {final_resolution}\n\n\
             As the elected leader, write the closing summary. Set requiresExecution to true \
             only if the resolution describes work someone must now carry out, and in that \
             case include a concise executionBrief.\n\n{mandate}",
            phases = phases.join("\n"),
            mandate = Self::json_mandate(
                r#"{"summaryMarkdown": "...", "finalResolution": "...", "requiresExecution": true|false, "executionBrief": "..."}"#
            ),
        )
    }

    /// Prompt for the initial documentation draft (free text, not JSON).
    pub fn documentation_draft(
        human_prompt: &str,
        final_resolution: &str,
        phase_results: &[PhaseResult],
    ) -> String {
        let phases: Vec<String> = phase_results
            .iter()
            .map(|r| format!("- {}: {}", r.phase_id, r.final_resolution))
            .collect();
        format!(
            "Write the council's documentation for the deliberation on:\n{human_prompt}\n\n\
             Final resolution: {final_resolution}\n\nPhase outcomes:\n{phases}\n\n\
             Produce a complete, self-contained markdown document: context, the decision, \
             the reasoning that led to it, rejected alternatives, and follow-ups. \
             Respond with the markdown document only — no preamble.",
            phases = phases.join("\n"),
        )
    }

    /// Prompt asking a non-YES voter for structured review feedback.
    pub fn documentation_feedback(draft: &str) -> String {
        format!(
            "You voted against approving the council's documentation draft below.\n\n\
             ---\n{draft}\n---\n\n\
             State what blocks approval. criticalBlockers lists at most 5 defects that must \
             be fixed; suggestedChanges lists at most 6 optional improvements.\n\n{mandate}",
            mandate = Self::json_mandate(
                r#"{"criticalBlockers": [{"id": "B1", "section": "...", "problem": "...", "impact": "...", "requiredChange": "...", "severity": "high"|"medium"|"low"}], "suggestedChanges": ["..."]}"#
            ),
        )
    }

    /// Prompt for a documentation revision (free text, not JSON).
    pub fn documentation_revision(draft: &str, feedback_json: &str) -> String {
        format!(
            "Your documentation draft did not reach approval. Revise it.\n\n\
             Current draft:\n---\n{draft}\n---\n\n\
             Reviewer feedback (JSON):\n{feedback_json}\n\n\
             Address every critical blocker. Keep what reviewers did not object to. \
             Respond with the full revised markdown document only — no preamble.",
        )
    }

    /// Prompt for the documentation approval vote.
    pub fn documentation_approval(draft: &str, revision: u32) -> String {
        format!(
            "The council votes on approving revision {revision} of its documentation:\n\n\
             ---\n{draft}\n---\n\n\
             Vote YES only if the document is accurate and complete enough to publish.\n\n{mandate}",
            mandate = Self::json_mandate(r#"{"ballot": "YES"|"NO"|"ABSTAIN", "rationale": "..."}"#),
        )
    }

    /// One-line vote result notice appended to the transcript context.
    pub fn vote_result_line(motion: &Motion, outcome: &TallyOutcome) -> String {
        format!(
            "Motion \"{}\" {}: {} yes / {} effective no of {} seats.",
            motion.title,
            if outcome.passed { "PASSED" } else { "FAILED" },
            outcome.yes_votes,
            outcome.no_votes_effective,
            outcome.total_council_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::tally;
    use crate::phase::entities::Governance;

    fn motion() -> Motion {
        Motion {
            motion_id: "m-1".to_string(),
            title: "Adopt plan B".to_string(),
            text: "Plan B is cheaper.".to_string(),
            decision_if_pass: "The council adopts plan B.".to_string(),
            proposer: "alice".to_string(),
            round: 1,
            turn_index: 3,
        }
    }

    #[test]
    fn test_turn_prompt_contains_window_and_mandate() {
        let transcript = vec![TranscriptEntry {
            phase_id: "scope".to_string(),
            round: 1,
            speaker: "alice".to_string(),
            text: "Let us start small.".to_string(),
        }];
        let prompt = PromptTemplate::turn(
            "Should we rewrite the ingest service?",
            "Phase: scope — agree on scope\nRound 1 of 3",
            &["Stay concrete.".to_string()],
            1,
            3,
            &transcript,
            None,
        );
        assert!(prompt.contains("alice: Let us start small."));
        assert!(prompt.contains("you have 3 turn(s) left"));
        assert!(prompt.contains("exactly one line of JSON"));
        assert!(prompt.contains("CALL_VOTE"));
    }

    #[test]
    fn test_transcript_window_is_bounded() {
        let transcript: Vec<TranscriptEntry> = (0..40)
            .map(|i| TranscriptEntry {
                phase_id: "scope".to_string(),
                round: 1,
                speaker: format!("m{i}"),
                text: format!("line {i}"),
            })
            .collect();
        let prompt = PromptTemplate::turn("q", "ctx", &[], 1, 3, &transcript, None);
        assert!(!prompt.contains("line 0"));
        assert!(prompt.contains("line 39"));
    }

    #[test]
    fn test_seconding_prompt_names_proposer() {
        let prompt = PromptTemplate::seconding(&motion(), &[]);
        assert!(prompt.contains("alice has called a vote"));
        assert!(prompt.contains("\"second\": true|false"));
    }

    #[test]
    fn test_vote_prompt_mentions_blindness() {
        let prompt = PromptTemplate::vote(&motion(), &[]);
        assert!(prompt.contains("blind"));
        assert!(prompt.contains("ABSTAIN"));
    }

    #[test]
    fn test_vote_result_line() {
        let outcome = tally(
            &[],
            &Governance {
                require_seconding: true,
                majority_threshold: 0.5,
                abstain_counts_as_no: true,
            },
            3,
        );
        let line = PromptTemplate::vote_result_line(&motion(), &outcome);
        assert!(line.contains("FAILED"));
        assert!(line.contains("3 seats"));
    }
}

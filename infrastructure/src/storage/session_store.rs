//! Filesystem session recorder
//!
//! Persists one session under `<root>/sessions/<sessionId>/`:
//!
//! - `events.json`: the ordered event stream, rewritten whole on every
//!   append so the on-disk file is always a valid JSON document,
//! - `transcript.md`: a human-readable running transcript, appended,
//! - `session.json`: the final session state document,
//! - named artifacts (leader summary, documentation drafts, handoff).
//!
//! Every append is flushed before returning, so the stream is replayable
//! after any crash that survives the last successful write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use conclave_application::{RecorderError, SessionRecorder};
use conclave_domain::{Event, EventKind, SessionStateDoc};
use serde_json::Value;
use tracing::debug;

pub struct FsSessionRecorder {
    session_dir: PathBuf,
    events: Mutex<Vec<Event>>,
}

impl FsSessionRecorder {
    /// Create the session directory and an empty transcript.
    pub fn create(root_dir: &Path, session_id: &str) -> Result<Self, RecorderError> {
        let session_dir = root_dir.join("sessions").join(session_id);
        fs::create_dir_all(&session_dir).map_err(|e| RecorderError::Io(e.to_string()))?;
        fs::write(
            session_dir.join("transcript.md"),
            format!("# Council session `{session_id}`\n"),
        )
        .map_err(|e| RecorderError::Io(e.to_string()))?;
        Ok(Self {
            session_dir,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<(), RecorderError> {
        fs::write(self.session_dir.join(name), contents)
            .map_err(|e| RecorderError::Io(e.to_string()))
    }

    fn append_transcript(&self, line: &str) -> Result<(), RecorderError> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(self.session_dir.join("transcript.md"))
            .map_err(|e| RecorderError::Io(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| RecorderError::Io(e.to_string()))?;
        file.flush().map_err(|e| RecorderError::Io(e.to_string()))
    }
}

fn payload_str<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("?")
}

/// Render one event as a transcript line.
fn transcript_line(event: &Event) -> String {
    let actor = event.actor_id.as_deref().unwrap_or("council");
    let payload = &event.payload;
    match event.kind {
        EventKind::SessionStarted => format!(
            "\n> **{}** convenes on: {}\n",
            payload_str(payload, "councilName"),
            payload_str(payload, "humanPrompt"),
        ),
        EventKind::LeaderElectionBallot => format!(
            "- {actor} votes {} for leader",
            payload_str(payload, "candidateId")
        ),
        EventKind::LeaderElected => format!("\n**Leader elected:** {}\n", actor),
        EventKind::PhaseStarted => format!(
            "\n## Phase `{}` — {}\n",
            payload_str(payload, "phaseId"),
            payload_str(payload, "goal"),
        ),
        EventKind::RoundStarted => {
            format!("\n### Round {}\n", payload.get("round").and_then(Value::as_u64).unwrap_or(0))
        }
        EventKind::TurnAction => format!(
            "<!-- turn {}: {} by {} -->",
            event.turn_index,
            payload_str(payload, "action"),
            actor
        ),
        EventKind::MessageContributed => {
            format!("**{actor}**: {}", payload_str(payload, "message"))
        }
        EventKind::PassRecorded => {
            format!("_{actor} passes_ ({})", payload_str(payload, "reason"))
        }
        EventKind::MotionCalled => format!(
            "\n**Motion `{}`** by {actor}: \"{}\" — {}",
            payload_str(payload, "motionId"),
            payload_str(payload, "title"),
            payload_str(payload, "text"),
        ),
        EventKind::SecondingResponse => format!(
            "- {actor} {} seconding",
            if payload.get("second").and_then(Value::as_bool).unwrap_or(false) {
                "offers"
            } else {
                "declines"
            }
        ),
        EventKind::MotionSeconded => format!("_Motion seconded by {actor}._"),
        EventKind::MotionNotSeconded => "_Motion found no seconder; discussion resumes._".to_string(),
        EventKind::VoteCast => format!("- {actor} votes {}", payload_str(payload, "ballot")),
        EventKind::VoteResult => format!(
            "\n**Vote result:** {} ({} yes / {} effective no of {})\n",
            if payload.get("passed").and_then(Value::as_bool).unwrap_or(false) {
                "PASSED"
            } else {
                "FAILED"
            },
            payload.get("yesVotes").and_then(Value::as_u64).unwrap_or(0),
            payload.get("noVotesEffective").and_then(Value::as_u64).unwrap_or(0),
            payload.get("totalCouncilSize").and_then(Value::as_u64).unwrap_or(0),
        ),
        EventKind::RoundLimitReached => "\n_Round limit reached._".to_string(),
        EventKind::PhaseCompleted => format!(
            "_Phase completed ({}): {}_",
            payload_str(payload, "endedBy"),
            payload_str(payload, "finalResolution"),
        ),
        EventKind::PhaseTransition => format!(
            "\n---\n_Transition: {} -> {}_",
            payload_str(payload, "from"),
            payload.get("to").and_then(Value::as_str).unwrap_or("(end)"),
        ),
        EventKind::LeaderSummaryRecorded => {
            format!("\n**Leader summary recorded** ({})", actor)
        }
        EventKind::DocumentDraftWritten | EventKind::DocumentRevisionWritten => format!(
            "_Documentation draft v{} written._",
            payload.get("revision").and_then(Value::as_u64).unwrap_or(0)
        ),
        EventKind::DocumentApprovalVoteCalled => format!(
            "_Approval vote called on revision {}._",
            payload.get("revision").and_then(Value::as_u64).unwrap_or(0)
        ),
        EventKind::DocumentApprovalVoteResult => format!(
            "_Approval vote: {}._",
            if payload.get("passed").and_then(Value::as_bool).unwrap_or(false) {
                "approved"
            } else {
                "rejected"
            }
        ),
        EventKind::DocumentFeedbackCollected => format!(
            "_Review feedback collected ({} blockers)._",
            payload.get("blockerCount").and_then(Value::as_u64).unwrap_or(0)
        ),
        EventKind::SessionClosed => format!(
            "\n---\n\n**Session closed** ({}). Final resolution: {}",
            payload_str(payload, "endedBy"),
            payload_str(payload, "finalResolution"),
        ),
    }
}

#[async_trait]
impl SessionRecorder for FsSessionRecorder {
    async fn append(&self, event: &Event) -> Result<(), RecorderError> {
        let serialized = {
            let mut events = self
                .events
                .lock()
                .map_err(|_| RecorderError::Io("event log mutex poisoned".to_string()))?;
            events.push(event.clone());
            serde_json::to_string_pretty(&*events)
                .map_err(|e| RecorderError::Serialization(e.to_string()))?
        };
        self.write_file("events.json", &serialized)?;
        self.append_transcript(&transcript_line(event))?;
        debug!(seq = event.seq, kind = %event.kind, "event flushed");
        Ok(())
    }

    async fn write_artifact(&self, name: &str, contents: &str) -> Result<(), RecorderError> {
        self.write_file(name, contents)
    }

    async fn finalize(&self, state: &SessionStateDoc) -> Result<(), RecorderError> {
        let body = serde_json::to_string_pretty(state)
            .map_err(|e| RecorderError::Serialization(e.to_string()))?;
        self.write_file("session.json", &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{EndedBy, PhaseState};
    use serde_json::json;

    fn event(seq: u64, kind: EventKind, payload: Value) -> Event {
        Event {
            seq,
            session_id: "sess-1".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            phase_state: PhaseState::Discussion,
            kind,
            round: 1,
            turn_index: seq,
            actor_id: Some("alice".to_string()),
            payload,
        }
    }

    #[tokio::test]
    async fn test_events_survive_every_append() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FsSessionRecorder::create(dir.path(), "sess-1").unwrap();

        recorder
            .append(&event(1, EventKind::MessageContributed, json!({"message": "hi"})))
            .await
            .unwrap();
        recorder
            .append(&event(2, EventKind::PassRecorded, json!({"reason": "done"})))
            .await
            .unwrap();

        let on_disk =
            fs::read_to_string(dir.path().join("sessions/sess-1/events.json")).unwrap();
        let events: Vec<Event> = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 1);
        assert_eq!(events[1].kind, EventKind::PassRecorded);
    }

    #[tokio::test]
    async fn test_transcript_is_human_readable() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FsSessionRecorder::create(dir.path(), "sess-1").unwrap();

        recorder
            .append(&event(
                1,
                EventKind::MessageContributed,
                json!({"message": "we should benchmark first"}),
            ))
            .await
            .unwrap();
        recorder
            .append(&event(2, EventKind::VoteCast, json!({"ballot": "YES"})))
            .await
            .unwrap();

        let transcript =
            fs::read_to_string(dir.path().join("sessions/sess-1/transcript.md")).unwrap();
        assert!(transcript.contains("**alice**: we should benchmark first"));
        assert!(transcript.contains("alice votes YES"));
    }

    #[tokio::test]
    async fn test_artifacts_and_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FsSessionRecorder::create(dir.path(), "sess-1").unwrap();

        recorder
            .write_artifact("leader-summary.md", "# Summary")
            .await
            .unwrap();

        let state = SessionStateDoc {
            session_id: "sess-1".to_string(),
            leader_id: "alice".to_string(),
            human_prompt: "decide".to_string(),
            phase_results: vec![],
            ended_by: EndedBy::MajorityVote,
            final_resolution: "done".to_string(),
            documentation_approved: None,
            execution_approved: None,
            artifacts: vec!["leader-summary.md".to_string()],
        };
        recorder.finalize(&state).await.unwrap();

        let summary =
            fs::read_to_string(dir.path().join("sessions/sess-1/leader-summary.md")).unwrap();
        assert_eq!(summary, "# Summary");

        let session =
            fs::read_to_string(dir.path().join("sessions/sess-1/session.json")).unwrap();
        let parsed: SessionStateDoc = serde_json::from_str(&session).unwrap();
        assert_eq!(parsed.leader_id, "alice");
    }
}

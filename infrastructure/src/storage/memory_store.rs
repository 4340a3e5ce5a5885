//! Filesystem memory store
//!
//! Layout under the configured memory directory:
//!
//! ```text
//! <memoryDir>/
//!   COUNCIL.json          canonical council memory
//!   COUNCIL.md            rendered snapshot
//!   <memberId>/
//!     AGENT.md            member profile
//!     MEMORY.json         canonical member memory
//!     MEMORY.md           rendered snapshot
//! ```
//!
//! The store is written exactly once per session, at close: upserts, prune,
//! digest truncation, and the prompt-context recompute all happen then. The
//! snapshot a member sees during a session is whatever the previous session
//! left behind.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use conclave_application::{MemoryError, MemoryStore};
use conclave_domain::memory::document::{
    COUNCIL_DIGEST_BOUND, COUNCIL_RECORD_BOUND, MEMBER_DIGEST_BOUND, MEMBER_RECORD_BOUND,
};
use conclave_domain::{CouncilConfig, Member, MemoryDocument, PromptContext, SessionMemoryInput};
use tracing::{debug, info};

const COUNCIL_OWNER: &str = "council";

pub struct FsMemoryStore {
    memory_dir: PathBuf,
}

impl FsMemoryStore {
    pub fn new(memory_dir: impl Into<PathBuf>) -> Self {
        Self {
            memory_dir: memory_dir.into(),
        }
    }

    fn member_dir(&self, member_id: &str) -> PathBuf {
        self.memory_dir.join(member_id)
    }

    fn load_document(path: &Path, owner: &str) -> Result<MemoryDocument, MemoryError> {
        if !path.exists() {
            return Ok(MemoryDocument::new(owner));
        }
        let raw = fs::read_to_string(path).map_err(|e| MemoryError::Io(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| MemoryError::Serialization(e.to_string()))
    }

    fn save_document(dir: &Path, name: &str, doc: &MemoryDocument) -> Result<(), MemoryError> {
        let canonical = serde_json::to_string_pretty(doc)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;
        fs::write(dir.join(format!("{name}.json")), canonical)
            .map_err(|e| MemoryError::Io(e.to_string()))?;
        fs::write(dir.join(format!("{name}.md")), doc.render_markdown())
            .map_err(|e| MemoryError::Io(e.to_string()))
    }

    fn profile_markdown(member: &Member) -> String {
        let mut out = format!(
            "# {} (`{}`)\n\nRole: {}\nModel: {}/{}\n",
            member.name, member.id, member.role, member.model.provider, member.model.model
        );
        if !member.traits.is_empty() {
            out.push_str(&format!("Traits: {}\n", member.traits.join(", ")));
        }
        if !member.focus_weights.is_empty() {
            out.push_str("\nFocus weights:\n");
            for (topic, weight) in &member.focus_weights {
                out.push_str(&format!("- {topic}: {weight:.1}\n"));
            }
        }
        out
    }
}

#[async_trait]
impl MemoryStore for FsMemoryStore {
    async fn prepare(&self, config: &CouncilConfig) -> Result<(), MemoryError> {
        fs::create_dir_all(&self.memory_dir).map_err(|e| MemoryError::Io(e.to_string()))?;

        let council_path = self.memory_dir.join("COUNCIL.json");
        if !council_path.exists() {
            let doc = MemoryDocument::new(COUNCIL_OWNER);
            Self::save_document(&self.memory_dir, "COUNCIL", &doc)?;
        }

        for member in &config.members {
            let dir = self.member_dir(&member.id);
            fs::create_dir_all(&dir).map_err(|e| MemoryError::Io(e.to_string()))?;

            let profile_path = dir.join("AGENT.md");
            if !profile_path.exists() {
                fs::write(&profile_path, Self::profile_markdown(member))
                    .map_err(|e| MemoryError::Io(e.to_string()))?;
            }
            if !dir.join("MEMORY.json").exists() {
                let doc = MemoryDocument::new(&member.id);
                Self::save_document(&dir, "MEMORY", &doc)?;
            }
        }
        debug!(dir = %self.memory_dir.display(), "memory store prepared");
        Ok(())
    }

    async fn member_context(&self, member_id: &str) -> Result<Option<PromptContext>, MemoryError> {
        let path = self.member_dir(member_id).join("MEMORY.json");
        if !path.exists() {
            return Ok(None);
        }
        let doc = Self::load_document(&path, member_id)?;
        if doc.prompt_context.is_empty() {
            Ok(None)
        } else {
            Ok(Some(doc.prompt_context))
        }
    }

    async fn record_session(&self, input: &SessionMemoryInput) -> Result<(), MemoryError> {
        for member_id in &input.member_ids {
            let dir = self.member_dir(member_id);
            fs::create_dir_all(&dir).map_err(|e| MemoryError::Io(e.to_string()))?;

            let path = dir.join("MEMORY.json");
            let mut doc = Self::load_document(&path, member_id)?;
            for record in input.member_upserts(member_id) {
                doc.upsert(record);
            }
            doc.note_session(&input.session_id, MEMBER_DIGEST_BOUND);
            doc.prune(MEMBER_RECORD_BOUND);
            doc.rebuild_prompt_context();
            Self::save_document(&dir, "MEMORY", &doc)?;
        }

        let council_path = self.memory_dir.join("COUNCIL.json");
        let mut doc = Self::load_document(&council_path, COUNCIL_OWNER)?;
        for record in input.council_upserts() {
            doc.upsert(record);
        }
        doc.note_session(&input.session_id, COUNCIL_DIGEST_BOUND);
        doc.prune(COUNCIL_RECORD_BOUND);
        doc.rebuild_prompt_context();
        Self::save_document(&self.memory_dir, "COUNCIL", &doc)?;

        info!(session = %input.session_id, members = input.member_ids.len(), "session memory recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::{
        ContextVerbosity, DocumentationReviewPolicy, ExecutionPolicy, ModelRef, OutputType,
        SessionPolicy, StoragePolicy,
    };
    use std::collections::{BTreeMap, BTreeSet};

    fn member(id: &str) -> Member {
        Member {
            id: id.to_string(),
            name: id.to_uppercase(),
            role: "advisor".to_string(),
            system_prompt: "advise".to_string(),
            traits: vec!["curious".to_string()],
            focus_weights: BTreeMap::from([("risk".to_string(), 0.8)]),
            model: ModelRef {
                provider: "openai".to_string(),
                model: "gpt".to_string(),
                temperature: None,
                max_tokens: None,
            },
        }
    }

    fn config(memory_dir: &Path) -> CouncilConfig {
        CouncilConfig {
            council_name: "board".to_string(),
            purpose: "deciding".to_string(),
            members: vec![member("alice"), member("bob"), member("carol")],
            turn_order: None,
            phases: vec![],
            session: SessionPolicy {
                entry_phase_id: "main".to_string(),
                max_phase_transitions: 12,
                phase_context_verbosity: ContextVerbosity::Standard,
            },
            output: OutputType::None,
            documentation_review: DocumentationReviewPolicy::default(),
            storage: StoragePolicy {
                root_dir: memory_dir.to_path_buf(),
                memory_dir: memory_dir.to_path_buf(),
            },
            execution: ExecutionPolicy::default(),
        }
    }

    fn input(session_id: &str) -> SessionMemoryInput {
        SessionMemoryInput {
            session_id: session_id.to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            final_resolution: "Adopt plan B".to_string(),
            member_ids: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
            last_contributions: BTreeMap::from([(
                "alice".to_string(),
                "Plan B is cheaper.".to_string(),
            )]),
            parse_fallback_members: BTreeSet::from(["bob".to_string()]),
            ended_by_round_limit: false,
            requires_execution: false,
            execution_approved: None,
        }
    }

    #[tokio::test]
    async fn test_prepare_seeds_profiles_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.prepare(&config(dir.path())).await.unwrap();

        assert!(dir.path().join("COUNCIL.json").exists());
        assert!(dir.path().join("alice/AGENT.md").exists());
        assert!(dir.path().join("alice/MEMORY.json").exists());
        assert!(dir.path().join("alice/MEMORY.md").exists());

        let profile = fs::read_to_string(dir.path().join("alice/AGENT.md")).unwrap();
        assert!(profile.contains("Role: advisor"));
    }

    #[tokio::test]
    async fn test_record_session_upserts_and_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.prepare(&config(dir.path())).await.unwrap();
        store.record_session(&input("s-1")).await.unwrap();

        // Alice's stance and the decision are both visible next session.
        let context = store.member_context("alice").await.unwrap().unwrap();
        assert!(context.decisions.iter().any(|d| d.contains("Adopt plan B")));

        // Bob's parse fallback became a risk record.
        let bob_raw = fs::read_to_string(dir.path().join("bob/MEMORY.json")).unwrap();
        let bob: MemoryDocument = serde_json::from_str(&bob_raw).unwrap();
        assert!(bob.records.iter().any(|r| r.id == "risk_pattern:parse_fallback:bob"));

        // The council document carries the cross-agent lesson.
        let council_raw = fs::read_to_string(dir.path().join("COUNCIL.json")).unwrap();
        let council: MemoryDocument = serde_json::from_str(&council_raw).unwrap();
        assert!(council.records.iter().any(|r| r.id == "lesson:parse_fallback:s-1"));
    }

    #[tokio::test]
    async fn test_recording_same_session_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.prepare(&config(dir.path())).await.unwrap();
        store.record_session(&input("s-1")).await.unwrap();
        store.record_session(&input("s-1")).await.unwrap();

        let raw = fs::read_to_string(dir.path().join("alice/MEMORY.json")).unwrap();
        let doc: MemoryDocument = serde_json::from_str(&raw).unwrap();
        let decisions = doc.records.iter().filter(|r| r.id == "decision:s-1").count();
        assert_eq!(decisions, 1);
        assert_eq!(doc.recent_sessions, vec!["s-1".to_string()]);
    }

    #[tokio::test]
    async fn test_member_records_stay_bounded_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMemoryStore::new(dir.path());
        store.prepare(&config(dir.path())).await.unwrap();

        for i in 0..60 {
            store.record_session(&input(&format!("s-{i}"))).await.unwrap();
        }

        let raw = fs::read_to_string(dir.path().join("alice/MEMORY.json")).unwrap();
        let doc: MemoryDocument = serde_json::from_str(&raw).unwrap();
        assert!(doc.records.len() <= MEMBER_RECORD_BOUND);
        assert!(doc.recent_sessions.len() <= MEMBER_DIGEST_BOUND);
    }
}

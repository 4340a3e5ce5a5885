//! Bounded memory documents and the derived prompt context
//!
//! A [`MemoryDocument`] is the canonical on-disk form of one memory surface
//! (one member, or the council). It holds the record set, a digest of recent
//! session ids, and the [`PromptContext`] snapshot derived from both. The
//! snapshot is recomputed once at session close; mid-session reads see the
//! previous session's snapshot.

use serde::{Deserialize, Serialize};

use super::record::{MemoryRecord, RecordKind, RecordStatus};

/// Per-member record bound after pruning
pub const MEMBER_RECORD_BOUND: usize = 80;
/// Council-level record bound after pruning
pub const COUNCIL_RECORD_BOUND: usize = 80;
/// Per-member recent-session digest bound
pub const MEMBER_DIGEST_BOUND: usize = 40;
/// Council recent-session digest bound
pub const COUNCIL_DIGEST_BOUND: usize = 50;
/// A record fades from prompts when its evidence falls outside this many
/// most-recent sessions (it stays on disk)
pub const FADE_WINDOW_SESSIONS: usize = 25;

const CONSTRAINTS_CAP: usize = 4;
const DECISIONS_CAP: usize = 5;
const RISKS_CAP: usize = 4;
const OPEN_LOOPS_CAP: usize = 4;
const PREFERENCES_CAP: usize = 3;
const ANTI_PATTERNS_CAP: usize = 3;

/// Bounded, bucketed view over a memory document, injected into prompts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub constraints: Vec<String>,
    pub decisions: Vec<String>,
    pub risks: Vec<String>,
    pub open_loops: Vec<String>,
    pub preferences: Vec<String>,
    pub anti_patterns: Vec<String>,
}

impl PromptContext {
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
            && self.decisions.is_empty()
            && self.risks.is_empty()
            && self.open_loops.is_empty()
            && self.preferences.is_empty()
            && self.anti_patterns.is_empty()
    }

    /// Render for prompt injection; empty buckets are omitted.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (label, lines) in [
            ("Constraints", &self.constraints),
            ("Decisions", &self.decisions),
            ("Risks and assumptions", &self.risks),
            ("Open loops", &self.open_loops),
            ("Preferences", &self.preferences),
            ("Anti-patterns", &self.anti_patterns),
        ] {
            if lines.is_empty() {
                continue;
            }
            out.push_str(label);
            out.push_str(":\n");
            for line in lines {
                out.push_str("- ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }
}

/// Canonical memory document for one member or the council
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDocument {
    /// Member id, or the council name for the shared document
    pub owner: String,
    pub records: Vec<MemoryRecord>,
    /// Most-recent-first session id digest
    pub recent_sessions: Vec<String>,
    /// Snapshot derived at last session close
    pub prompt_context: PromptContext,
}

impl MemoryDocument {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            records: Vec::new(),
            recent_sessions: Vec::new(),
            prompt_context: PromptContext::default(),
        }
    }

    /// Insert or replace a record by id, preserving the original
    /// `created_at` on replacement.
    pub fn upsert(&mut self, record: MemoryRecord) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.id == record.id) {
            let created_at = existing.created_at.clone();
            *existing = record;
            existing.created_at = created_at;
        } else {
            self.records.push(record);
        }
    }

    /// Prepend a session id to the digest, dropping duplicates and
    /// truncating to `digest_bound`.
    pub fn note_session(&mut self, session_id: &str, digest_bound: usize) {
        self.recent_sessions.retain(|s| s != session_id);
        self.recent_sessions.insert(0, session_id.to_string());
        self.recent_sessions.truncate(digest_bound);
    }

    /// Keep the top `record_bound` records by `(importance desc,
    /// updated_at desc)`. The on-disk record count never exceeds the bound.
    pub fn prune(&mut self, record_bound: usize) {
        self.records.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        self.records.truncate(record_bound);
    }

    /// Recompute the prompt-context snapshot.
    ///
    /// Only `Active` records with evidence inside the most-recent
    /// [`FADE_WINDOW_SESSIONS`] window contribute; older records stay on
    /// disk but fade from prompts. Buckets are filled in importance order
    /// up to fixed caps.
    pub fn rebuild_prompt_context(&mut self) {
        let window: Vec<String> = self
            .recent_sessions
            .iter()
            .take(FADE_WINDOW_SESSIONS)
            .cloned()
            .collect();

        let mut visible: Vec<&MemoryRecord> = self
            .records
            .iter()
            .filter(|r| r.status == RecordStatus::Active && r.has_recent_evidence(&window))
            .collect();
        visible.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });

        let mut context = PromptContext::default();
        for record in visible {
            let line = format!("{} (importance {})", record.summary, record.importance);
            let (bucket, cap): (&mut Vec<String>, usize) = match record.kind {
                RecordKind::Constraint => (&mut context.constraints, CONSTRAINTS_CAP),
                RecordKind::Decision | RecordKind::Outcome => {
                    (&mut context.decisions, DECISIONS_CAP)
                }
                RecordKind::RiskPattern | RecordKind::Assumption => {
                    (&mut context.risks, RISKS_CAP)
                }
                RecordKind::OpenLoop => (&mut context.open_loops, OPEN_LOOPS_CAP),
                RecordKind::Preference => (&mut context.preferences, PREFERENCES_CAP),
                RecordKind::Lesson => (&mut context.anti_patterns, ANTI_PATTERNS_CAP),
            };
            if bucket.len() < cap {
                bucket.push(line);
            }
        }

        self.prompt_context = context;
    }

    /// Human-readable rendering, written alongside the canonical JSON.
    pub fn render_markdown(&self) -> String {
        let mut out = format!("# Memory: {}\n\n", self.owner);

        if self.records.is_empty() {
            out.push_str("No records yet.\n");
            return out;
        }

        out.push_str("## Records\n\n");
        for record in &self.records {
            out.push_str(&format!(
                "- `{}` [{:?}/{:?}] {} (importance {}, confidence {:.2}, updated {})\n",
                record.id,
                record.kind,
                record.status,
                record.summary,
                record.importance,
                record.confidence,
                record.updated_at,
            ));
        }

        if !self.recent_sessions.is_empty() {
            out.push_str("\n## Recent sessions\n\n");
            for session in &self.recent_sessions {
                out.push_str(&format!("- {session}\n"));
            }
        }

        let rendered = self.prompt_context.render();
        if !rendered.is_empty() {
            out.push_str("\n## Prompt context\n\n");
            out.push_str(&rendered);
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::EvidenceRef;

    fn record(id: &str, kind: RecordKind, importance: u8, session: &str, at: &str) -> MemoryRecord {
        MemoryRecord::new(id, kind, format!("summary of {id}"), at)
            .with_importance(importance)
            .with_evidence(EvidenceRef::new(session))
    }

    #[test]
    fn test_upsert_replaces_by_id_and_keeps_created_at() {
        let mut doc = MemoryDocument::new("alice");
        doc.upsert(record("r1", RecordKind::Decision, 3, "s1", "t1"));
        let mut updated = record("r1", RecordKind::Decision, 5, "s2", "t2");
        updated.summary = "revised".to_string();
        doc.upsert(updated);

        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.records[0].summary, "revised");
        assert_eq!(doc.records[0].created_at, "t1");
        assert_eq!(doc.records[0].updated_at, "t2");
    }

    #[test]
    fn test_prune_keeps_top_by_importance_then_recency() {
        let mut doc = MemoryDocument::new("alice");
        doc.upsert(record("low-old", RecordKind::Lesson, 1, "s1", "2026-01-01T00:00:00Z"));
        doc.upsert(record("high", RecordKind::Decision, 5, "s1", "2026-01-01T00:00:00Z"));
        doc.upsert(record("low-new", RecordKind::Lesson, 1, "s1", "2026-02-01T00:00:00Z"));
        doc.prune(2);

        let ids: Vec<&str> = doc.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "low-new"]);
    }

    #[test]
    fn test_record_count_never_exceeds_bound() {
        let mut doc = MemoryDocument::new("alice");
        for i in 0..200 {
            doc.upsert(record(
                &format!("r{i}"),
                RecordKind::Decision,
                3,
                "s1",
                &format!("2026-01-01T00:00:{:02}Z", i % 60),
            ));
        }
        doc.prune(MEMBER_RECORD_BOUND);
        assert_eq!(doc.records.len(), MEMBER_RECORD_BOUND);
    }

    #[test]
    fn test_digest_dedupes_and_truncates() {
        let mut doc = MemoryDocument::new("alice");
        for i in 0..60 {
            doc.note_session(&format!("s{i}"), MEMBER_DIGEST_BOUND);
        }
        doc.note_session("s59", MEMBER_DIGEST_BOUND);

        assert_eq!(doc.recent_sessions.len(), MEMBER_DIGEST_BOUND);
        assert_eq!(doc.recent_sessions[0], "s59");
        assert_eq!(doc.recent_sessions.iter().filter(|s| *s == "s59").count(), 1);
    }

    #[test]
    fn test_prompt_context_buckets_by_kind() {
        let mut doc = MemoryDocument::new("alice");
        doc.note_session("s1", MEMBER_DIGEST_BOUND);
        doc.upsert(record("c1", RecordKind::Constraint, 5, "s1", "t1"));
        doc.upsert(record("d1", RecordKind::Decision, 4, "s1", "t1"));
        doc.upsert(record("o1", RecordKind::Outcome, 4, "s1", "t1"));
        doc.upsert(record("k1", RecordKind::RiskPattern, 3, "s1", "t1"));
        doc.upsert(record("a1", RecordKind::Assumption, 3, "s1", "t1"));
        doc.upsert(record("l1", RecordKind::OpenLoop, 3, "s1", "t1"));
        doc.upsert(record("p1", RecordKind::Preference, 2, "s1", "t1"));
        doc.upsert(record("x1", RecordKind::Lesson, 2, "s1", "t1"));
        doc.rebuild_prompt_context();

        assert_eq!(doc.prompt_context.constraints.len(), 1);
        assert_eq!(doc.prompt_context.decisions.len(), 2);
        assert_eq!(doc.prompt_context.risks.len(), 2);
        assert_eq!(doc.prompt_context.open_loops.len(), 1);
        assert_eq!(doc.prompt_context.preferences.len(), 1);
        assert_eq!(doc.prompt_context.anti_patterns.len(), 1);
    }

    #[test]
    fn test_prompt_context_respects_bucket_caps() {
        let mut doc = MemoryDocument::new("alice");
        doc.note_session("s1", MEMBER_DIGEST_BOUND);
        for i in 0..10 {
            doc.upsert(record(&format!("d{i}"), RecordKind::Decision, 3, "s1", "t1"));
        }
        doc.rebuild_prompt_context();
        assert_eq!(doc.prompt_context.decisions.len(), DECISIONS_CAP);
    }

    #[test]
    fn test_faded_records_stay_on_disk_but_leave_prompts() {
        let mut doc = MemoryDocument::new("alice");
        doc.upsert(record("old", RecordKind::Decision, 5, "ancient", "t1"));
        // 26 newer sessions push "ancient" outside the fade window
        for i in 0..=FADE_WINDOW_SESSIONS {
            doc.note_session(&format!("s{i}"), MEMBER_DIGEST_BOUND);
        }
        doc.rebuild_prompt_context();

        assert_eq!(doc.records.len(), 1);
        assert!(doc.prompt_context.decisions.is_empty());
    }

    #[test]
    fn test_inactive_records_do_not_reach_prompts() {
        let mut doc = MemoryDocument::new("alice");
        doc.note_session("s1", MEMBER_DIGEST_BOUND);
        doc.upsert(
            record("r1", RecordKind::OpenLoop, 4, "s1", "t1")
                .with_status(RecordStatus::Resolved),
        );
        doc.rebuild_prompt_context();
        assert!(doc.prompt_context.open_loops.is_empty());
    }

    #[test]
    fn test_render_markdown_lists_records() {
        let mut doc = MemoryDocument::new("alice");
        doc.note_session("s1", MEMBER_DIGEST_BOUND);
        doc.upsert(record("r1", RecordKind::Decision, 4, "s1", "t1"));
        doc.rebuild_prompt_context();

        let md = doc.render_markdown();
        assert!(md.contains("# Memory: alice"));
        assert!(md.contains("`r1`"));
        assert!(md.contains("## Prompt context"));
    }
}

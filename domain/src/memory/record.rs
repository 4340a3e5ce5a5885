//! Durable memory records

use serde::{Deserialize, Serialize};

/// What kind of knowledge a record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Preference,
    Constraint,
    Decision,
    Assumption,
    RiskPattern,
    Lesson,
    OpenLoop,
    Outcome,
}

/// Lifecycle status of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Resolved,
    Superseded,
    Stale,
}

/// A pointer from a record to the session that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EvidenceRef {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One durable knowledge item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable record id; upserts are keyed on this
    pub id: String,
    pub kind: RecordKind,
    pub status: RecordStatus,
    pub summary: String,
    /// 1 (trivia) to 5 (load-bearing)
    pub importance: u8,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub evidence: Vec<EvidenceRef>,
    /// RFC 3339 UTC
    pub created_at: String,
    /// RFC 3339 UTC; drives prune ordering
    pub updated_at: String,
}

impl MemoryRecord {
    pub fn new(
        id: impl Into<String>,
        kind: RecordKind,
        summary: impl Into<String>,
        now: impl Into<String>,
    ) -> Self {
        let now = now.into();
        Self {
            id: id.into(),
            kind,
            status: RecordStatus::Active,
            summary: summary.into(),
            importance: 3,
            confidence: 0.7,
            evidence: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance.clamp(1, 5);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// Whether any evidence ref points into `recent` session ids.
    pub fn has_recent_evidence(&self, recent: &[String]) -> bool {
        self.evidence
            .iter()
            .any(|e| recent.iter().any(|s| *s == e.session_id))
    }
}

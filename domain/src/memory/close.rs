//! Session-close memory upserts
//!
//! Pure planning of the records written when a session closes. Record ids
//! are stable (`decision:<sessionId>`, `outcome:<sessionId>:<memberId>`,
//! `risk_pattern:parse_fallback:<memberId>`, ...) so re-recording the same
//! session is idempotent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::record::{EvidenceRef, MemoryRecord, RecordKind, RecordStatus};

/// Everything the memory store needs to know about a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMemoryInput {
    pub session_id: String,
    /// RFC 3339 close timestamp, stamped on every upserted record
    pub timestamp: String,
    pub final_resolution: String,
    pub member_ids: Vec<String>,
    /// Member id -> last MESSAGE_CONTRIBUTED text, if any
    pub last_contributions: BTreeMap<String, String>,
    /// Members that hit the JSON parse-fallback path at least once
    pub parse_fallback_members: BTreeSet<String>,
    pub ended_by_round_limit: bool,
    pub requires_execution: bool,
    pub execution_approved: Option<bool>,
}

impl SessionMemoryInput {
    fn evidence(&self) -> EvidenceRef {
        EvidenceRef::new(self.session_id.clone())
    }

    /// Records to upsert into one member's document.
    pub fn member_upserts(&self, member_id: &str) -> Vec<MemoryRecord> {
        let mut records = Vec::new();

        records.push(
            MemoryRecord::new(
                format!("decision:{}", self.session_id),
                RecordKind::Decision,
                self.final_resolution.clone(),
                self.timestamp.clone(),
            )
            .with_importance(5)
            .with_confidence(0.9)
            .with_evidence(self.evidence()),
        );

        let stance = self
            .last_contributions
            .get(member_id)
            .cloned()
            .unwrap_or_else(|| "Did not contribute a message this session.".to_string());
        records.push(
            MemoryRecord::new(
                format!("outcome:{}:{member_id}", self.session_id),
                RecordKind::Outcome,
                stance,
                self.timestamp.clone(),
            )
            .with_importance(3)
            .with_confidence(0.8)
            .with_evidence(self.evidence()),
        );

        if self.parse_fallback_members.contains(member_id) {
            records.push(
                MemoryRecord::new(
                    format!("risk_pattern:parse_fallback:{member_id}"),
                    RecordKind::RiskPattern,
                    "Returned unparseable JSON at least once; deterministic fallback was \
                     substituted."
                        .to_string(),
                    self.timestamp.clone(),
                )
                .with_importance(4)
                .with_confidence(0.9)
                .with_evidence(self.evidence()),
            );
        }

        if self.ended_by_round_limit {
            records.push(
                MemoryRecord::new(
                    format!("open_loop:{}", self.session_id),
                    RecordKind::OpenLoop,
                    "Session hit its round limit without reaching consensus.".to_string(),
                    self.timestamp.clone(),
                )
                .with_importance(4)
                .with_confidence(0.9)
                .with_evidence(self.evidence()),
            );
        }

        if self.requires_execution {
            records.push(self.execution_record());
        }

        records
    }

    /// Records to upsert into the council-wide document.
    pub fn council_upserts(&self) -> Vec<MemoryRecord> {
        let mut records = Vec::new();

        records.push(
            MemoryRecord::new(
                format!("decision:{}", self.session_id),
                RecordKind::Decision,
                self.final_resolution.clone(),
                self.timestamp.clone(),
            )
            .with_importance(5)
            .with_confidence(0.9)
            .with_evidence(self.evidence()),
        );

        if !self.parse_fallback_members.is_empty() {
            let offenders: Vec<&str> = self
                .parse_fallback_members
                .iter()
                .map(String::as_str)
                .collect();
            records.push(
                MemoryRecord::new(
                    format!("lesson:parse_fallback:{}", self.session_id),
                    RecordKind::Lesson,
                    format!(
                        "Members {} produced unparseable JSON; their turns degraded to \
                         deterministic fallbacks.",
                        offenders.join(", ")
                    ),
                    self.timestamp.clone(),
                )
                .with_importance(4)
                .with_confidence(0.9)
                .with_evidence(self.evidence()),
            );
        }

        if self.ended_by_round_limit {
            records.push(
                MemoryRecord::new(
                    format!("open_loop:{}", self.session_id),
                    RecordKind::OpenLoop,
                    "Deliberation ended at the round limit; the adopted resolution is the \
                     phase fallback."
                        .to_string(),
                    self.timestamp.clone(),
                )
                .with_importance(4)
                .with_confidence(0.9)
                .with_evidence(self.evidence()),
            );
        }

        if self.requires_execution {
            records.push(self.execution_record());
        }

        records
    }

    fn execution_record(&self) -> MemoryRecord {
        let (status, summary) = match self.execution_approved {
            Some(true) => (
                RecordStatus::Resolved,
                "Execution of the resolution was approved and handed off.",
            ),
            _ => (
                RecordStatus::Active,
                "The resolution requires execution but approval is outstanding.",
            ),
        };
        let kind = match self.execution_approved {
            Some(true) => RecordKind::Outcome,
            _ => RecordKind::OpenLoop,
        };
        MemoryRecord::new(
            format!("execution:{}", self.session_id),
            kind,
            summary.to_string(),
            self.timestamp.clone(),
        )
        .with_importance(4)
        .with_confidence(0.9)
        .with_status(status)
        .with_evidence(self.evidence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> SessionMemoryInput {
        SessionMemoryInput {
            session_id: "s-1".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            final_resolution: "Adopt plan B".to_string(),
            member_ids: vec!["alice".to_string(), "bob".to_string(), "carol".to_string()],
            last_contributions: BTreeMap::from([(
                "alice".to_string(),
                "Plan B is cheaper.".to_string(),
            )]),
            parse_fallback_members: BTreeSet::new(),
            ended_by_round_limit: false,
            requires_execution: false,
            execution_approved: None,
        }
    }

    #[test]
    fn test_decision_and_stance_always_present() {
        let records = input().member_upserts("alice");
        assert!(records.iter().any(|r| r.id == "decision:s-1" && r.importance == 5));
        let stance = records.iter().find(|r| r.id == "outcome:s-1:alice").unwrap();
        assert_eq!(stance.summary, "Plan B is cheaper.");
    }

    #[test]
    fn test_silent_member_gets_placeholder_stance() {
        let records = input().member_upserts("bob");
        let stance = records.iter().find(|r| r.id == "outcome:s-1:bob").unwrap();
        assert!(stance.summary.contains("Did not contribute"));
    }

    #[test]
    fn test_parse_fallback_produces_risk_and_lesson() {
        let mut input = input();
        input.parse_fallback_members.insert("bob".to_string());

        let member = input.member_upserts("bob");
        assert!(member.iter().any(|r| r.id == "risk_pattern:parse_fallback:bob"));

        let clean = input.member_upserts("alice");
        assert!(!clean.iter().any(|r| r.id.starts_with("risk_pattern:")));

        let council = input.council_upserts();
        let lesson = council
            .iter()
            .find(|r| r.id == "lesson:parse_fallback:s-1")
            .unwrap();
        assert!(lesson.summary.contains("bob"));
    }

    #[test]
    fn test_round_limit_produces_open_loop() {
        let mut input = input();
        input.ended_by_round_limit = true;
        assert!(input.member_upserts("alice").iter().any(|r| r.id == "open_loop:s-1"));
        assert!(input.council_upserts().iter().any(|r| r.id == "open_loop:s-1"));
    }

    #[test]
    fn test_execution_record_reflects_approval() {
        let mut input = input();
        input.requires_execution = true;

        input.execution_approved = Some(false);
        let pending = input.member_upserts("alice");
        let record = pending.iter().find(|r| r.id == "execution:s-1").unwrap();
        assert_eq!(record.kind, RecordKind::OpenLoop);
        assert_eq!(record.status, RecordStatus::Active);

        input.execution_approved = Some(true);
        let done = input.member_upserts("alice");
        let record = done.iter().find(|r| r.id == "execution:s-1").unwrap();
        assert_eq!(record.kind, RecordKind::Outcome);
        assert_eq!(record.status, RecordStatus::Resolved);
    }
}

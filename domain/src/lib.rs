//! Domain layer for conclave
//!
//! This crate contains the deliberation protocol's core types and pure logic:
//! council configuration, phases and transitions, motions, ballots, events,
//! prompts, response normalization, and structured member memory.
//! It has no dependencies on infrastructure or presentation concerns.

pub mod ballot;
pub mod council;
pub mod core;
pub mod event;
pub mod json;
pub mod memory;
pub mod motion;
pub mod phase;
pub mod prompt;
pub mod protocol;
pub mod session;

// Re-export commonly used types
pub use ballot::{Ballot, BallotChoice, TallyOutcome, tally};
pub use council::{
    config::{
        ContextVerbosity, CouncilConfig, DocumentationReviewPolicy, ExecutionPolicy, Member,
        ModelRef, OutputType, SessionPolicy, StoragePolicy,
    },
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use core::error::DomainError;
pub use event::{Event, EventKind, PhaseState};
pub use memory::{
    close::SessionMemoryInput,
    document::{MemoryDocument, PromptContext},
    record::{EvidenceRef, MemoryRecord, RecordKind, RecordStatus},
};
pub use motion::Motion;
pub use phase::{
    context::PhaseContextPacket,
    entities::{
        Deliverable, EvidenceRequirements, FallbackAction, Governance, MemoryPolicy, Phase,
        PhaseFallback, PhaseTransition, StopConditions, TransitionTrigger,
    },
    transition::{EndedBy, resolve_transition},
};
pub use prompt::PromptTemplate;
pub use protocol::{
    action::{ElectionBallot, SecondingReply, TurnAction, VoteReply},
    normalize,
    reply::JsonReply,
    review::{ReviewBlocker, ReviewFeedback},
};
pub use session::{
    ExecutionHandoff, LeaderSummary, PhaseResult, SessionOutcome, SessionStateDoc, TranscriptEntry,
};

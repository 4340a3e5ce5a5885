//! Council configuration
//!
//! The immutable input spec for a deliberation session: the member roster,
//! the phase graph, and the session/output/storage/execution policies.

pub mod config;
pub mod validation;

pub use config::{
    ContextVerbosity, CouncilConfig, DocumentationReviewPolicy, ExecutionPolicy, Member, ModelRef,
    OutputType, SessionPolicy, StoragePolicy,
};
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};

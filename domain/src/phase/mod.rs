//! Deliberation phases
//!
//! A phase is a node in the deliberation graph. It carries its own round
//! limit, governance parameters, memory policy, and outgoing transitions.

pub mod context;
pub mod entities;
pub mod transition;

pub use context::PhaseContextPacket;
pub use entities::{
    Deliverable, EvidenceRequirements, FallbackAction, Governance, MemoryPolicy, Phase,
    PhaseFallback, PhaseTransition, StopConditions, TransitionTrigger,
};
pub use transition::{EndedBy, resolve_transition};

//! Application layer for conclave
//!
//! This crate contains the ports (interfaces to the outside world) and the
//! use cases that drive a deliberation session: leader election, the phase
//! runner with its motion sub-machine, the documentation review loop, and
//! the top-level session orchestrator.

pub mod ports;
pub mod session;

pub use ports::{
    clock::{Clock, IdGenerator},
    memory_store::{MemoryError, MemoryStore},
    model_client::{ClientError, CompletionOptions, ModelClient},
    recorder::{RecorderError, SessionRecorder},
};
pub use session::{DeliberationSession, SessionDeps, SessionError};

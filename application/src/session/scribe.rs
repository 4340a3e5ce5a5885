//! Event sequencer
//!
//! The single writer behind the session's totally ordered event stream.
//! Sequence numbers and the session-global turn index live here; every
//! emitted event is flushed durably by the recorder before `emit` returns.

use std::sync::Arc;

use conclave_domain::{Event, EventKind, PhaseState};
use serde_json::Value;
use tracing::debug;

use super::error::SessionError;
use crate::ports::clock::Clock;
use crate::ports::recorder::SessionRecorder;

pub(crate) struct EventScribe {
    session_id: String,
    recorder: Arc<dyn SessionRecorder>,
    clock: Arc<dyn Clock>,
    seq: u64,
    turn_index: u64,
}

impl EventScribe {
    pub fn new(
        session_id: impl Into<String>,
        recorder: Arc<dyn SessionRecorder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            recorder,
            clock,
            seq: 0,
            turn_index: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn turn_index(&self) -> u64 {
        self.turn_index
    }

    /// Start the next turn, returning its session-global index.
    pub fn begin_turn(&mut self) -> u64 {
        self.turn_index += 1;
        self.turn_index
    }

    /// Append one event. The sequence number is assigned here and never
    /// reused; the append is durable when this returns.
    pub async fn emit(
        &mut self,
        kind: EventKind,
        phase_state: PhaseState,
        round: u32,
        actor_id: Option<&str>,
        payload: Value,
    ) -> Result<(), SessionError> {
        self.seq += 1;
        let event = Event {
            seq: self.seq,
            session_id: self.session_id.clone(),
            timestamp: self.clock.now_rfc3339(),
            phase_state,
            kind,
            round,
            turn_index: self.turn_index,
            actor_id: actor_id.map(str::to_string),
            payload,
        };
        debug!(seq = event.seq, kind = %event.kind, actor = ?event.actor_id, "event");
        self.recorder.append(&event).await?;
        Ok(())
    }
}

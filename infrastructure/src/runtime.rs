//! System clock and id generation
//!
//! Production implementations of the [`Clock`] and [`IdGenerator`] ports.
//! Tests supply their own pinned implementations; nothing here is consulted
//! by the core logic directly.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use conclave_application::{Clock, IdGenerator};

/// UTC wall clock, RFC 3339 with millisecond precision
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Id generator with one session id per instance and counted motion ids.
///
/// The session id is fixed at construction so the caller can create the
/// session directory before handing the generator to the orchestrator.
pub struct SequentialIdGenerator {
    session_id: String,
    motion_counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self {
            session_id: format!("sess-{}", Utc::now().format("%Y%m%d-%H%M%S%3f")),
            motion_counter: AtomicU64::new(0),
        }
    }

    /// Pin the session id, for replays and tests.
    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            motion_counter: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    fn motion_id(&self) -> String {
        let n = self.motion_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("motion-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_stable_per_instance() {
        let ids = SequentialIdGenerator::with_session_id("sess-1");
        assert_eq!(ids.session_id(), "sess-1");
        assert_eq!(ids.session_id(), "sess-1");
    }

    #[test]
    fn test_motion_ids_count_up() {
        let ids = SequentialIdGenerator::with_session_id("sess-1");
        assert_eq!(ids.motion_id(), "motion-1");
        assert_eq!(ids.motion_id(), "motion-2");
    }

    #[test]
    fn test_clock_emits_rfc3339_utc() {
        let now = SystemClock.now_rfc3339();
        assert!(now.ends_with('Z'));
        assert!(now.contains('T'));
    }
}

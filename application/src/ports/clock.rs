//! Clock and id generation ports
//!
//! Both are pluggable so tests can pin time and ids and assert byte-stable
//! event streams.

/// Source of timestamps
pub trait Clock: Send + Sync {
    /// Current UTC time as RFC 3339 with millisecond precision.
    fn now_rfc3339(&self) -> String;
}

/// Source of session and motion ids
pub trait IdGenerator: Send + Sync {
    /// A fresh session id, unique per invocation.
    fn session_id(&self) -> String;

    /// A fresh motion id, unique within the session.
    fn motion_id(&self) -> String;
}

//! Model reply envelope

use serde_json::Value;

/// Outcome of a JSON-mode model call.
///
/// Transport and provider failures are errors and never reach this type;
/// a reply that arrived but could not be decoded into JSON is carried as
/// [`JsonReply::ParseError`] so the normalizers can substitute the
/// deterministic fallback instead of aborting the session.
#[derive(Debug, Clone)]
pub enum JsonReply {
    /// A decoded JSON object
    Value(Value),
    /// The raw reply could not be decoded
    ParseError {
        /// Human-readable decode failure
        message: String,
        /// Verbatim model output, kept for the event log
        raw: String,
    },
}

impl JsonReply {
    pub fn parse_error(message: impl Into<String>, raw: impl Into<String>) -> Self {
        JsonReply::ParseError {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, JsonReply::ParseError { .. })
    }
}

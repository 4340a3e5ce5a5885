//! Hard length caps for protocol reply fields
//!
//! Every JSON prompt embeds this table and the normalizers enforce it by
//! truncation, so a runaway model cannot flood the transcript or the event
//! log.

/// Maximum characters in a CONTRIBUTE message
pub const MESSAGE_MAX: usize = 1200;
/// Maximum characters in a PASS reason
pub const REASON_MAX: usize = 300;
/// Maximum characters in a PASS note
pub const NOTE_MAX: usize = 200;
/// Maximum characters in a motion title
pub const TITLE_MAX: usize = 120;
/// Maximum characters in a motion text
pub const MOTION_TEXT_MAX: usize = 800;
/// Maximum characters in a decision-if-pass clause
pub const DECISION_MAX: usize = 400;
/// Maximum characters in any rationale
pub const RATIONALE_MAX: usize = 400;

/// Truncate to `max` characters on a char boundary.
pub fn clip(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        value.chars().take(max).collect()
    }
}

/// Render the cap table for prompt injection.
pub fn render_table() -> String {
    format!(
        "Hard length limits (characters): message {MESSAGE_MAX}, reason {REASON_MAX}, \
         note {NOTE_MAX}, title {TITLE_MAX}, motion text {MOTION_TEXT_MAX}, \
         decisionIfPass {DECISION_MAX}, rationale {RATIONALE_MAX}. \
         Longer values are truncated."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_short_string_unchanged() {
        assert_eq!(clip("hello", 10), "hello");
    }

    #[test]
    fn test_clip_truncates_on_char_boundary() {
        assert_eq!(clip("héllo wörld", 5), "héllo");
    }

    #[test]
    fn test_table_mentions_every_cap() {
        let table = render_table();
        assert!(table.contains("1200"));
        assert!(table.contains("120"));
        assert!(table.contains("800"));
    }
}

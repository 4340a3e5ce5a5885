//! Structured member and council memory
//!
//! Each member (and the council as a whole) owns a bounded set of
//! [`record::MemoryRecord`]s plus a derived prompt-context snapshot. Records
//! are upserted once at session close; the snapshot is what conditions the
//! member's prompts in the next session.

pub mod close;
pub mod document;
pub mod record;

pub use close::SessionMemoryInput;
pub use document::{MemoryDocument, PromptContext};
pub use record::{EvidenceRef, MemoryRecord, RecordKind, RecordStatus};

//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Council has no members")]
    EmptyCouncil,

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::EmptyCouncil.is_cancelled());
        assert!(!DomainError::UnknownMember("a".to_string()).is_cancelled());
    }
}

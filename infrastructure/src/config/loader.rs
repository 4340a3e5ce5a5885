//! Configuration loader
//!
//! Loads the council configuration from a JSON file (with `CONCLAVE_*`
//! environment overrides), converts it into the domain model, and validates
//! it. Any `Error`-severity issue aborts before a single event is emitted.

use std::path::Path;

use conclave_domain::{ConfigIssue, CouncilConfig, Severity};
use figment::{
    Figment,
    providers::{Env, Format, Json},
};
use thiserror::Error;
use tracing::warn;

use super::file_config::FileConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration: {0}")]
    Read(Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Loads and validates council configurations
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, convert, and validate.
    ///
    /// Warnings are logged and tolerated; errors abort. Environment
    /// variables prefixed `CONCLAVE_` override file values
    /// (e.g. `CONCLAVE_EXECUTION__REQUIREHUMANAPPROVAL=false`).
    pub fn load(path: &Path) -> Result<CouncilConfig, ConfigError> {
        let file: FileConfig = Figment::new()
            .merge(Json::file(path))
            .merge(Env::prefixed("CONCLAVE_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Read(Box::new(e)))?;

        let config = file
            .into_domain()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let issues = config.validate();
        for issue in issues.iter().filter(|i| i.severity == Severity::Warning) {
            warn!(issue = %issue.message, "config warning");
        }
        let errors: Vec<&ConfigIssue> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigError::Invalid(joined));
        }

        Ok(config)
    }

    /// Load without aborting on validation errors; returns the config (when
    /// structurally readable) plus every issue, for `conclave validate`.
    pub fn inspect(path: &Path) -> Result<(CouncilConfig, Vec<ConfigIssue>), ConfigError> {
        let file: FileConfig = Figment::new()
            .merge(Json::file(path))
            .merge(Env::prefixed("CONCLAVE_").split("__"))
            .extract()
            .map_err(|e| ConfigError::Read(Box::new(e)))?;

        let config = file
            .into_domain()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let issues = config.validate();
        Ok((config, issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"{
        "councilName": "review board",
        "purpose": "design reviews",
        "members": [
            {"id": "a", "name": "A", "role": "lead", "systemPrompt": "lead reviews",
             "model": {"provider": "openai", "model": "gpt"}},
            {"id": "b", "name": "B", "role": "skeptic", "systemPrompt": "find risks",
             "model": {"provider": "openai", "model": "gpt"}},
            {"id": "c", "name": "C", "role": "pragmatist", "systemPrompt": "ship it",
             "model": {"provider": "openai", "model": "gpt"}}
        ],
        "phases": [{"id": "main", "goal": "decide"}],
        "sessionPolicy": {"entryPhaseId": "main"}
    }"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_loads() {
        let file = write_config(VALID);
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.council_size(), 3);
        assert_eq!(config.session.entry_phase_id, "main");
    }

    #[test]
    fn test_even_council_is_rejected_before_any_session_activity() {
        let invalid = VALID.replace(
            r#"{"id": "c", "name": "C", "role": "pragmatist", "systemPrompt": "ship it",
             "model": {"provider": "openai", "model": "gpt"}}"#,
            r#"{"id": "c", "name": "C", "role": "pragmatist", "systemPrompt": "ship it",
             "model": {"provider": "openai", "model": "gpt"}},
            {"id": "d", "name": "D", "role": "fourth", "systemPrompt": "even things out",
             "model": {"provider": "openai", "model": "gpt"}}"#,
        );
        let file = write_config(&invalid);
        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("odd"));
    }

    #[test]
    fn test_unreachable_phase_is_rejected() {
        let invalid = VALID.replace(
            r#""phases": [{"id": "main", "goal": "decide"}]"#,
            r#""phases": [{"id": "main", "goal": "decide"}, {"id": "island", "goal": "lost"}]"#,
        );
        let file = write_config(&invalid);
        let err = ConfigLoader::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("island"));
    }

    #[test]
    fn test_inspect_reports_issues_without_aborting() {
        let invalid = VALID.replace(
            r#""phases": [{"id": "main", "goal": "decide"}]"#,
            r#""phases": [{"id": "main", "goal": "decide"}, {"id": "island", "goal": "lost"}]"#,
        );
        let file = write_config(&invalid);
        let (config, issues) = ConfigLoader::inspect(file.path()).unwrap();
        assert_eq!(config.phases.len(), 2);
        assert!(issues.iter().any(|i| i.severity == Severity::Error));
    }
}

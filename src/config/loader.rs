//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SubmitterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SubmitterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SubmitterConfig, ConfigError> {
    let config: SubmitterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [blockchain]
            rpc_url = "http://127.0.0.1:8545"
            chain_id = 31337

            [submission]
            gas_bump_permille = 1200
            max_fee_gwei = 50
            max_attempts = 0

            [monitor]
            registry_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            pause_interval_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.blockchain.chain_id, 31337);
        assert_eq!(config.submission.gas_bump_permille, 1200);
        assert_eq!(config.submission.max_attempts, 0);
        assert_eq!(config.monitor.pause_interval_secs, 15);
    }

    #[test]
    fn test_validation_error_surfaces() {
        let err = parse_config(
            r#"
            [submission]
            gas_bump_permille = 900
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed"));
        assert!(message.contains("submission.gas_bump_permille"));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("[submission").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/submitter.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (bump factor, confirmations, intervals)
//! - Check that URLs and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SubmitterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::SubmitterConfig;

/// Minimum bump factor: a bump must never lower a fee.
pub const MIN_GAS_BUMP_PERMILLE: u64 = 1_000;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SubmitterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.blockchain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            format!("'{}' is not a valid URL", config.blockchain.rpc_url),
        ));
    }
    for failover in &config.blockchain.failover_urls {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "blockchain.failover_urls",
                format!("'{}' is not a valid URL", failover),
            ));
        }
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be > 0"));
    }
    if config.blockchain.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "blockchain.receipt_poll_interval_ms",
            "must be > 0",
        ));
    }

    let submission = &config.submission;
    if submission.gas_bump_permille < MIN_GAS_BUMP_PERMILLE {
        errors.push(ValidationError::new(
            "submission.gas_bump_permille",
            format!(
                "{} is below {}; bumps would lower fees",
                submission.gas_bump_permille, MIN_GAS_BUMP_PERMILLE
            ),
        ));
    }
    if submission.max_fee_gwei == 0 {
        errors.push(ValidationError::new("submission.max_fee_gwei", "must be > 0"));
    }
    if submission.confirmations == 0 {
        errors.push(ValidationError::new("submission.confirmations", "must be >= 1"));
    }
    if submission.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "submission.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    if submission.fee_poll_interval_secs == 0 {
        errors.push(ValidationError::new(
            "submission.fee_poll_interval_secs",
            "must be > 0",
        ));
    }
    if submission.retry_backoff_max_ms < submission.retry_backoff_base_ms {
        errors.push(ValidationError::new(
            "submission.retry_backoff_max_ms",
            format!(
                "{} is below retry_backoff_base_ms ({})",
                submission.retry_backoff_max_ms, submission.retry_backoff_base_ms
            ),
        ));
    }

    let monitor = &config.monitor;
    if monitor.registry_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "monitor.registry_address",
            format!("'{}' is not a valid address", monitor.registry_address),
        ));
    }
    if let Some(principal) = &monitor.principal {
        if principal.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                "monitor.principal",
                format!("'{}' is not a valid address", principal),
            ));
        }
    }
    if monitor.pause_interval_secs == 0 {
        errors.push(ValidationError::new("monitor.pause_interval_secs", "must be > 0"));
    }
    if monitor.authorization_interval_secs == 0 {
        errors.push(ValidationError::new(
            "monitor.authorization_interval_secs",
            "must be > 0",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the submitter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wei per gwei.
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Root configuration for the transaction submitter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubmitterConfig {
    /// Chain connectivity settings.
    pub blockchain: BlockchainConfig,

    /// Submission engine settings (fees, retries, confirmations).
    pub submission: SubmissionConfig,

    /// Background monitor settings.
    pub monitor: MonitorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Receipt polling interval while waiting for confirmations.
    pub receipt_poll_interval_ms: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            receipt_poll_interval_ms: 2_000,
        }
    }
}

/// Submission engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Fee and gas bump factor in permille (1100 = +10% per bump).
    pub gas_bump_permille: u64,

    /// Maximum acceptable base fee (or legacy gas price) in gwei.
    pub max_fee_gwei: u64,

    /// Block confirmations required before a receipt is accepted.
    pub confirmations: u64,

    /// How long to wait for confirmations before treating the attempt as timed out.
    pub confirmation_timeout_secs: u64,

    /// Maximum number of broadcast attempts (0 = unlimited).
    pub max_attempts: u32,

    /// Delay between fee polls while fees are above the ceiling.
    pub fee_poll_interval_secs: u64,

    /// Delay before surfacing a possibly-duplicated broadcast.
    pub duplicate_settle_secs: u64,

    /// Pause before returning once the attempt limit is exhausted.
    pub give_up_pause_secs: u64,

    /// Delay before the first retry; doubles per attempt (0 = resend immediately).
    pub retry_backoff_base_ms: u64,

    /// Upper bound on the retry delay.
    pub retry_backoff_max_ms: u64,
}

impl SubmissionConfig {
    /// Fee ceiling in wei.
    pub fn max_fee_wei(&self) -> u128 {
        u128::from(self.max_fee_gwei).saturating_mul(WEI_PER_GWEI)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn fee_poll_interval(&self) -> Duration {
        Duration::from_secs(self.fee_poll_interval_secs)
    }

    pub fn duplicate_settle(&self) -> Duration {
        Duration::from_secs(self.duplicate_settle_secs)
    }

    pub fn give_up_pause(&self) -> Duration {
        Duration::from_secs(self.give_up_pause_secs)
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            gas_bump_permille: 1_100,
            max_fee_gwei: 100,
            confirmations: 3,
            confirmation_timeout_secs: 180,
            max_attempts: 5,
            fee_poll_interval_secs: 30,
            duplicate_settle_secs: 30,
            give_up_pause_secs: 30,
            retry_backoff_base_ms: 1_000,
            retry_backoff_max_ms: 30_000,
        }
    }
}

/// Network-state monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address of the operator registry contract exposing `paused()` and `isOperatorFor()`.
    pub registry_address: String,

    /// Principal the signer acts on behalf of. Defaults to the signer itself.
    pub principal: Option<String>,

    /// Pause flag polling interval in seconds.
    pub pause_interval_secs: u64,

    /// Authorization polling interval in seconds.
    pub authorization_interval_secs: u64,
}

impl MonitorConfig {
    pub fn pause_interval(&self) -> Duration {
        Duration::from_secs(self.pause_interval_secs)
    }

    pub fn authorization_interval(&self) -> Duration {
        Duration::from_secs(self.authorization_interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            registry_address: String::new(),
            principal: None,
            pause_interval_secs: 60,
            authorization_interval_secs: 300,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

//! Chain-specific types and error definitions.

use alloy::primitives::{Bytes, Log, TxHash};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::TransportError;
use std::time::Duration;
use thiserror::Error;

pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

/// What a failed chain call means for the caller.
///
/// Node implementations only report free text; [`ErrorKind::from_message`] is
/// the single place where that text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The same transaction (or another one with this nonce) is already in the pool or mined.
    AlreadyKnown,
    /// The nonce was already consumed.
    NonceTooLow,
    /// The offered fee is below what the pool or the block accepts.
    FeeTooLow,
    /// A deadline elapsed before the node answered or the transaction confirmed.
    Timeout,
    /// Execution ran out of gas.
    OutOfGas,
    Other,
}

const ALREADY_KNOWN_PATTERNS: &[&str] = &[
    "already known",
    "known transaction",
    "transaction already imported",
    "same hash was already imported",
    "nonce has already been used",
    "transaction already exists",
];

const NONCE_TOO_LOW_PATTERNS: &[&str] = &[
    "nonce too low",
    "nonce is too low",
    "oldnonce",
];

const FEE_TOO_LOW_PATTERNS: &[&str] = &[
    "underpriced",
    "fee too low",
    "gas price too low",
    "less than block base fee",
    "feecap too low",
];

const OUT_OF_GAS_PATTERNS: &[&str] = &["out of gas"];

const TIMEOUT_PATTERNS: &[&str] = &["timeout", "timed out", "deadline exceeded"];

impl ErrorKind {
    /// Classify a node error message.
    pub fn from_message(message: &str) -> Self {
        let message = message.to_lowercase();
        let matches = |patterns: &[&str]| patterns.iter().any(|p| message.contains(p));

        if matches(ALREADY_KNOWN_PATTERNS) {
            Self::AlreadyKnown
        } else if matches(NONCE_TOO_LOW_PATTERNS) {
            Self::NonceTooLow
        } else if matches(FEE_TOO_LOW_PATTERNS) {
            Self::FeeTooLow
        } else if matches(OUT_OF_GAS_PATTERNS) {
            Self::OutOfGas
        } else if matches(TIMEOUT_PATTERNS) {
            Self::Timeout
        } else {
            Self::Other
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// The node rejected or failed the request.
    #[error("RPC error: {message}")]
    Rpc {
        kind: ErrorKind,
        message: String,
        /// Raw revert payload when the node attached one.
        revert_data: Option<Bytes>,
    },

    /// Every provider exceeded the request deadline.
    #[error("All RPC providers timed out during {operation}")]
    RpcTimeout { operation: &'static str },

    /// No provider could serve the request.
    #[error("All RPC providers failed during {operation}: {last_error}")]
    AllProvidersFailed {
        operation: &'static str,
        last_error: String,
    },

    /// Transaction was not confirmed within the allotted time.
    #[error("Transaction {tx_hash} not confirmed within {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl ChainError {
    /// Build an RPC error from a node message, classifying it on the way.
    pub fn rpc(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Rpc {
            kind: ErrorKind::from_message(&message),
            message,
            revert_data: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rpc { kind, .. } => *kind,
            Self::ConfirmationTimeout { .. } | Self::RpcTimeout { .. } => ErrorKind::Timeout,
            // Transport failures only carry text, e.g. "operation timed out".
            Self::AllProvidersFailed { last_error, .. } => ErrorKind::from_message(last_error),
            Self::Wallet(_) | Self::ChainMismatch { .. } => ErrorKind::Other,
        }
    }

    pub fn revert_data(&self) -> Option<&Bytes> {
        match self {
            Self::Rpc { revert_data, .. } => revert_data.as_ref(),
            _ => None,
        }
    }
}

impl From<TransportError> for ChainError {
    fn from(err: TransportError) -> Self {
        let revert_data = err.as_error_resp().and_then(|payload| payload.as_revert_data());
        let message = err.to_string();
        Self::Rpc {
            kind: ErrorKind::from_message(&message),
            message,
            revert_data,
        }
    }
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Fee conditions reported by the node, in wei.
///
/// Either `gas_price` alone (legacy) or both EIP-1559 fields (modern) are
/// meaningful; a snapshot carrying neither is rejected by the fee policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeSnapshot {
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl FeeSnapshot {
    pub fn legacy(gas_price: u128) -> Self {
        Self {
            gas_price: Some(gas_price),
            ..Default::default()
        }
    }

    pub fn eip1559(max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        Self {
            gas_price: None,
            max_fee_per_gas: Some(max_fee_per_gas),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
        }
    }
}

/// The parts of a finalized transaction the submitter acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// `true` when execution succeeded.
    pub status: bool,
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status: receipt.status(),
            gas_used: receipt.gas_used,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}

//! Terminal errors of the submission engine.

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::blockchain::types::ChainError;

/// A submission that cannot continue.
///
/// Every variant is fatal: retrying the same call without first
/// re-evaluating chain state would either fail again or risk a double
/// execution.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Fee data carried neither a legacy price nor both EIP-1559 fields.
    #[error("Fee data carries neither a gas price nor EIP-1559 fee fields")]
    InvalidFeeData,

    /// The call could not be estimated, so it would revert if sent.
    #[error("Gas estimation failed: {0}")]
    Estimation(#[source] ChainError),

    /// The sender's starting nonce could not be resolved.
    #[error("Nonce lookup failed: {0}")]
    Nonce(#[source] ChainError),

    /// The transaction was mined and reverted for a reason retrying cannot fix.
    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: TxHash, reason: String },

    /// The transaction was mined and reverted, and the replay gave no reason.
    #[error("Transaction {tx_hash} reverted for an unknown reason")]
    UndiagnosedRevert { tx_hash: TxHash },

    /// The node reports this transaction or nonce as already broadcast.
    ///
    /// The earlier attempt may have succeeded. Callers must reconcile chain
    /// state before deciding to submit again.
    #[error("Outcome unknown, nonce {nonce} may already have succeeded: {source}")]
    OutcomeUnknown {
        nonce: u64,
        #[source]
        source: ChainError,
    },
}

//! Revert reason recovery for failed receipts.

use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::decode_revert_reason;
use std::sync::Arc;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::ErrorKind;

/// Start of the message bytes in an `Error(string)` payload:
/// 4-byte selector, 32-byte offset word, 32-byte length word.
pub const REVERT_REASON_OFFSET: usize = 68;

/// Why a mined transaction reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    OutOfGas,
    Reason(String),
    Unknown,
}

impl std::fmt::Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfGas => f.write_str("out of gas"),
            Self::Reason(reason) => f.write_str(reason),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Read the reason string out of returned call data.
///
/// Only the conventional `Error(string)` layout decodes correctly; custom
/// error types come back as garbage or `None`.
pub fn decode_reason_at_offset(output: &[u8]) -> Option<String> {
    let text = output.get(REVERT_REASON_OFFSET..)?;
    let end = text.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let reason = std::str::from_utf8(&text[..end]).ok()?;
    (!reason.is_empty()).then(|| reason.to_string())
}

/// Replays reverted transactions read-only to learn why they failed.
#[derive(Clone)]
pub struct RevertDiagnoser {
    client: Arc<dyn ChainClient>,
}

impl RevertDiagnoser {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Replay `request` against `block` and classify the outcome.
    pub async fn diagnose(&self, request: &TransactionRequest, block: Option<u64>) -> RevertReason {
        let reason = match self.client.call(request, block).await {
            Ok(output) => decode_reason_at_offset(&output)
                .map(RevertReason::Reason)
                .unwrap_or(RevertReason::Unknown),
            Err(e) if e.kind() == ErrorKind::OutOfGas => RevertReason::OutOfGas,
            Err(e) => {
                let detail = e.revert_data().and_then(|data| decode_revert_reason(data));
                tracing::debug!(error = %e, detail = ?detail, "Replay raised an error");
                RevertReason::Unknown
            }
        };

        tracing::warn!(block = ?block, nonce = ?request.nonce, reason = %reason, "Diagnosed revert");
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{Revert, SolError};

    #[test]
    fn test_decodes_error_string_payload() {
        let payload = Revert {
            reason: "Ownable: caller is not the owner".to_string(),
        }
        .abi_encode();
        assert_eq!(
            decode_reason_at_offset(&payload).as_deref(),
            Some("Ownable: caller is not the owner")
        );
    }

    #[test]
    fn test_short_or_empty_output_has_no_reason() {
        assert_eq!(decode_reason_at_offset(&[]), None);
        assert_eq!(decode_reason_at_offset(&[0u8; 68]), None);
        assert_eq!(decode_reason_at_offset(&[0u8; 100]), None);
    }

    #[test]
    fn test_invalid_utf8_has_no_reason() {
        let mut output = vec![0u8; 68];
        output.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        assert_eq!(decode_reason_at_offset(&output), None);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(RevertReason::OutOfGas.to_string(), "out of gas");
        assert_eq!(RevertReason::Reason("nope".into()).to_string(), "nope");
        assert_eq!(RevertReason::Unknown.to_string(), "unknown");
    }
}

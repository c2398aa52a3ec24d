//! Maps a failed attempt to its corrective action.
//!
//! # Precedence
//! ```text
//! Reverted(out of gas)        → gas limit × bump, nonce + 1, retry
//! Reverted(unknown)           → fatal
//! Reverted(other reason)      → fatal
//! AlreadyKnown                → outcome unknown (fatal after settle delay)
//! NonceTooLow                 → nonce + 1, retry
//! FeeTooLow | Timeout         → fee fields × bump, retry
//! anything else               → retry unchanged
//! ```
//! Every retry advances the attempt counter.

use alloy::primitives::TxHash;

use crate::blockchain::types::{ChainError, ErrorKind};
use crate::submission::attempt::TransactionConfig;
use crate::submission::diagnose::RevertReason;
use crate::submission::error::SubmitError;

/// What went wrong with one attempt.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Mined with failure status.
    Reverted {
        tx_hash: TxHash,
        reason: RevertReason,
    },
    /// Broadcast or confirmation wait failed.
    Chain(ChainError),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reverted { tx_hash, reason } => write!(f, "{tx_hash} reverted: {reason}"),
            Self::Chain(error) => write!(f, "{error}"),
        }
    }
}

/// What the engine does next.
#[derive(Debug)]
pub enum Action {
    Retry(TransactionConfig),
    Fatal(SubmitError),
    /// Fatal, but the transaction may have landed; surfaced after a settle delay.
    OutcomeUnknown(SubmitError),
}

impl Action {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Retry(_) => "retry",
            Self::Fatal(_) => "fatal",
            Self::OutcomeUnknown(_) => "outcome_unknown",
        }
    }
}

/// Decide the corrective action for `failure` given the config that produced it.
pub fn classify(config: &TransactionConfig, failure: &Failure) -> Action {
    match failure {
        Failure::Reverted {
            reason: RevertReason::OutOfGas,
            ..
        } => Action::Retry(
            config
                .next_attempt()
                .with_bumped_gas_limit()
                .with_next_nonce(),
        ),
        Failure::Reverted {
            tx_hash,
            reason: RevertReason::Unknown,
        } => Action::Fatal(SubmitError::UndiagnosedRevert { tx_hash: *tx_hash }),
        Failure::Reverted {
            tx_hash,
            reason: RevertReason::Reason(reason),
        } => Action::Fatal(SubmitError::Reverted {
            tx_hash: *tx_hash,
            reason: reason.clone(),
        }),
        Failure::Chain(error) => match error.kind() {
            ErrorKind::AlreadyKnown => Action::OutcomeUnknown(SubmitError::OutcomeUnknown {
                nonce: config.nonce,
                source: error.clone(),
            }),
            ErrorKind::NonceTooLow => Action::Retry(config.next_attempt().with_next_nonce()),
            ErrorKind::FeeTooLow | ErrorKind::Timeout => {
                Action::Retry(config.next_attempt().with_bumped_fees())
            }
            ErrorKind::OutOfGas | ErrorKind::Other => Action::Retry(config.next_attempt()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::FeeSnapshot;
    use crate::submission::fees::FeeMechanism;
    use std::time::Duration;

    fn legacy() -> TransactionConfig {
        TransactionConfig::initial(
            FeeMechanism::Legacy,
            1_200,
            10,
            100_000,
            &FeeSnapshot::legacy(100),
        )
    }

    fn modern() -> TransactionConfig {
        TransactionConfig::initial(
            FeeMechanism::Modern,
            1_200,
            10,
            100_000,
            &FeeSnapshot::eip1559(1_000, 50),
        )
    }

    fn chain(message: &str) -> Failure {
        Failure::Chain(ChainError::rpc(message))
    }

    fn reverted(reason: RevertReason) -> Failure {
        Failure::Reverted {
            tx_hash: TxHash::repeat_byte(1),
            reason,
        }
    }

    fn retried(action: Action) -> TransactionConfig {
        match action {
            Action::Retry(config) => config,
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_gas_bumps_gas_and_nonce() {
        let next = retried(classify(&legacy(), &reverted(RevertReason::OutOfGas)));
        assert_eq!(next.attempt, 2);
        assert_eq!(next.gas_limit, 120_000);
        assert_eq!(next.nonce, 11);
        assert_eq!(next.gas_price, Some(100));
    }

    #[test]
    fn test_reverts_with_reason_or_unknown_are_fatal() {
        let action = classify(&legacy(), &reverted(RevertReason::Unknown));
        assert!(matches!(
            action,
            Action::Fatal(SubmitError::UndiagnosedRevert { .. })
        ));

        let action = classify(&legacy(), &reverted(RevertReason::Reason("paused".into())));
        match action {
            Action::Fatal(SubmitError::Reverted { reason, .. }) => assert_eq!(reason, "paused"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_already_known_is_outcome_unknown_without_mutation() {
        let config = legacy();
        let action = classify(&config, &chain("already known"));
        match action {
            Action::OutcomeUnknown(SubmitError::OutcomeUnknown { nonce, .. }) => {
                assert_eq!(nonce, config.nonce)
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(config, legacy());
    }

    #[test]
    fn test_nonce_too_low_only_touches_nonce() {
        for config in [legacy(), modern()] {
            let next = retried(classify(&config, &chain("nonce too low")));
            assert_eq!(next.nonce, config.nonce + 1);
            assert_eq!(next.gas_limit, config.gas_limit);
            assert_eq!(next.gas_price, config.gas_price);
            assert_eq!(next.max_fee_per_gas, config.max_fee_per_gas);
            assert_eq!(next.max_priority_fee_per_gas, config.max_priority_fee_per_gas);
        }
    }

    #[test]
    fn test_fee_bump_compounds_across_retries() {
        let first = retried(classify(&legacy(), &chain("transaction underpriced")));
        assert_eq!(first.gas_price, Some(120));
        let second = retried(classify(&first, &chain("replacement transaction underpriced")));
        assert_eq!(second.gas_price, Some(144));
        assert_eq!(second.attempt, 3);
        assert_eq!(second.nonce, 10);
    }

    #[test]
    fn test_modern_fee_bump_moves_both_fields() {
        let next = retried(classify(&modern(), &chain("max fee per gas less than block base fee")));
        assert_eq!(next.max_fee_per_gas, Some(1_200));
        assert_eq!(next.max_priority_fee_per_gas, Some(60));
        assert_eq!(next.gas_price, None);
    }

    #[test]
    fn test_confirmation_timeout_bumps_fees() {
        let failure = Failure::Chain(ChainError::ConfirmationTimeout {
            tx_hash: TxHash::ZERO,
            waited: Duration::from_secs(60),
        });
        let next = retried(classify(&legacy(), &failure));
        assert_eq!(next.gas_price, Some(120));
    }

    #[test]
    fn test_provider_timeout_bumps_fees() {
        let failure = Failure::Chain(ChainError::RpcTimeout {
            operation: "send_raw_transaction",
        });
        let next = retried(classify(&legacy(), &failure));
        assert_eq!(next.gas_price, Some(120));
        assert_eq!(next.nonce, 10);

        let failure = Failure::Chain(ChainError::AllProvidersFailed {
            operation: "send_raw_transaction",
            last_error: "operation timed out".to_string(),
        });
        let next = retried(classify(&modern(), &failure));
        assert_eq!(next.max_fee_per_gas, Some(1_200));
    }

    #[test]
    fn test_unmatched_error_retries_unchanged() {
        let config = legacy();
        let next = retried(classify(&config, &chain("connection reset by peer")));
        assert_eq!(
            next,
            TransactionConfig {
                attempt: 2,
                ..config
            }
        );
    }

    #[test]
    fn test_every_retry_branch_advances_attempt_by_one() {
        let config = TransactionConfig {
            attempt: 5,
            ..modern()
        };
        let failures = [
            reverted(RevertReason::OutOfGas),
            chain("nonce too low"),
            chain("transaction underpriced"),
            chain("request timed out"),
            chain("execution ran out of gas"),
            chain("something else entirely"),
        ];
        for failure in &failures {
            let next = retried(classify(&config, failure));
            assert_eq!(next.attempt, 6, "{failure:?}");
        }
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(classify(&legacy(), &chain("x")).label(), "retry");
        assert_eq!(classify(&legacy(), &chain("already known")).label(), "outcome_unknown");
        assert_eq!(
            classify(&legacy(), &reverted(RevertReason::Unknown)).label(),
            "fatal"
        );
    }
}

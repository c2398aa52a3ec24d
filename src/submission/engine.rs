//! The attempt loop.
//!
//! ```text
//! Gating → AwaitingFee → Sending → Pending → Confirmed
//!                           ↑          │
//!                           └─ Retry ←─┴─ Reverted / Error → classify
//! ```

use alloy::network::TransactionBuilder;
use alloy::primitives::TxHash;
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::client::ChainClient;
use crate::blockchain::transaction::TransactionSender;
use crate::blockchain::types::Receipt;
use crate::config::schema::SubmissionConfig;
use crate::observability::metrics;
use crate::reactive::ReactiveValue;
use crate::submission::attempt::{pad_gas_estimate, TransactionConfig};
use crate::submission::backoff::retry_backoff;
use crate::submission::classifier::{classify, Action, Failure};
use crate::submission::diagnose::RevertDiagnoser;
use crate::submission::error::SubmitError;
use crate::submission::fees::{classify_mechanism, FeePolicy};

/// Non-error result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Mined with success status and the configured depth reached.
    Confirmed(Receipt),
    /// The network is paused; nothing was built or sent.
    Paused,
    /// The sender may not act for the principal; nothing was built or sent.
    Unauthorized,
    /// The attempt limit ran out. The last broadcast may still confirm later.
    GaveUp {
        attempts: u32,
        last_tx_hash: Option<TxHash>,
    },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Confirmed(_) => "confirmed",
            Self::Paused => "paused",
            Self::Unauthorized => "unauthorized",
            Self::GaveUp { .. } => "gave_up",
        }
    }
}

/// Submits calls with fee gating, retries and confirmation tracking.
///
/// Attempts within one `execute` are strictly sequential. Concurrent
/// executions sharing a signing key must be serialized by the caller,
/// since nonces are resolved per submission.
#[derive(Clone)]
pub struct SubmissionEngine {
    client: Arc<dyn ChainClient>,
    sender: Arc<dyn TransactionSender>,
    fee_policy: FeePolicy,
    diagnoser: RevertDiagnoser,
    paused: ReactiveValue<bool>,
    authorized: ReactiveValue<bool>,
    settings: SubmissionConfig,
    chain_id: u64,
}

impl SubmissionEngine {
    pub fn new(
        client: Arc<dyn ChainClient>,
        sender: Arc<dyn TransactionSender>,
        paused: ReactiveValue<bool>,
        authorized: ReactiveValue<bool>,
        settings: SubmissionConfig,
        chain_id: u64,
    ) -> Self {
        let fee_policy = FeePolicy::new(
            client.clone(),
            settings.max_fee_wei(),
            settings.fee_poll_interval(),
        );
        let diagnoser = RevertDiagnoser::new(client.clone());
        Self {
            client,
            sender,
            fee_policy,
            diagnoser,
            paused,
            authorized,
            settings,
            chain_id,
        }
    }

    /// Submit `call` (recipient, value and data) until it confirms or fails fatally.
    ///
    /// Nonce, gas limit and fee fields of `call` are overwritten.
    pub async fn execute(&self, call: TransactionRequest) -> Result<Outcome, SubmitError> {
        let span = tracing::info_span!("submission", id = %Uuid::new_v4());
        let result = self.run(call).instrument(span).await;

        metrics::record_outcome(match &result {
            Ok(outcome) => outcome.label(),
            Err(_) => "error",
        });
        result
    }

    async fn run(&self, call: TransactionRequest) -> Result<Outcome, SubmitError> {
        if self.paused.read().await {
            tracing::info!("Network paused, not submitting");
            return Ok(Outcome::Paused);
        }
        if !self.authorized.read().await {
            tracing::info!(sender = %self.sender.address(), "Sender not authorized, not submitting");
            return Ok(Outcome::Unauthorized);
        }

        let fees = self.fee_policy.await_acceptable_fee().await?;
        let mechanism = classify_mechanism(&fees)?;

        let sender = self.sender.address();
        let call = call.with_from(sender).with_chain_id(self.chain_id);

        let estimate = self
            .client
            .estimate_gas(&call)
            .await
            .map_err(SubmitError::Estimation)?;
        let nonce = self
            .client
            .pending_nonce(sender)
            .await
            .map_err(SubmitError::Nonce)?;

        let mut config = TransactionConfig::initial(
            mechanism,
            self.settings.gas_bump_permille,
            nonce,
            pad_gas_estimate(estimate),
            &fees,
        );
        let mut last_tx_hash = None;

        loop {
            let max_attempts = self.settings.max_attempts;
            if max_attempts != 0 && config.attempt > max_attempts {
                tracing::warn!(
                    max_attempts,
                    last_tx_hash = ?last_tx_hash,
                    "Attempt limit reached, giving up"
                );
                sleep(self.settings.give_up_pause()).await;
                return Ok(Outcome::GaveUp {
                    attempts: max_attempts,
                    last_tx_hash,
                });
            }

            let request = config.apply(call.clone());
            tracing::info!(
                attempt = config.attempt,
                nonce = config.nonce,
                gas_limit = config.gas_limit,
                gas_price = ?config.gas_price,
                max_fee_per_gas = ?config.max_fee_per_gas,
                max_priority_fee_per_gas = ?config.max_priority_fee_per_gas,
                "Sending transaction"
            );
            metrics::record_attempt();

            let failure = match self.sender.send_transaction(request.clone()).await {
                Ok(tx_hash) => {
                    last_tx_hash = Some(tx_hash);
                    match self.await_success(&request, tx_hash).await {
                        Ok(receipt) => {
                            tracing::info!(
                                attempt = config.attempt,
                                tx_hash = %tx_hash,
                                block = ?receipt.block_number,
                                gas_used = receipt.gas_used,
                                "Transaction confirmed"
                            );
                            return Ok(Outcome::Confirmed(receipt));
                        }
                        Err(failure) => failure,
                    }
                }
                Err(e) => Failure::Chain(e),
            };

            let action = classify(&config, &failure);
            metrics::record_classification(action.label());

            match action {
                Action::Retry(next) => {
                    let delay = retry_backoff(
                        config.attempt,
                        self.settings.retry_backoff_base_ms,
                        self.settings.retry_backoff_max_ms,
                    );
                    tracing::warn!(
                        attempt = config.attempt,
                        error = %failure,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt failed, retrying"
                    );
                    sleep(delay).await;
                    config = next;
                }
                Action::Fatal(e) => {
                    tracing::error!(attempt = config.attempt, error = %e, "Submission failed");
                    return Err(e);
                }
                Action::OutcomeUnknown(e) => {
                    tracing::warn!(
                        attempt = config.attempt,
                        nonce = config.nonce,
                        error = %failure,
                        "Transaction may already be in flight, waiting before reporting"
                    );
                    sleep(self.settings.duplicate_settle()).await;
                    return Err(e);
                }
            }
        }
    }

    /// Wait for `tx_hash` and turn a failed receipt into a diagnosed revert.
    async fn await_success(
        &self,
        request: &TransactionRequest,
        tx_hash: TxHash,
    ) -> Result<Receipt, Failure> {
        let receipt = self
            .client
            .wait_for_receipt(
                tx_hash,
                self.settings.confirmations,
                self.settings.confirmation_timeout(),
            )
            .await
            .map_err(Failure::Chain)?;

        if receipt.status {
            return Ok(receipt);
        }

        let reason = self.diagnoser.diagnose(request, receipt.block_number).await;
        Err(Failure::Reverted { tx_hash, reason })
    }
}

impl std::fmt::Debug for SubmissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionEngine")
            .field("sender", &self.sender.address())
            .field("fee_policy", &self.fee_policy)
            .field("settings", &self.settings)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

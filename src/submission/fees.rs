//! Fee mechanism detection and fee ceiling enforcement.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::FeeSnapshot;
use crate::submission::error::SubmitError;

/// How a transaction pays for gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeMechanism {
    /// Single gas price.
    Legacy,
    /// EIP-1559 max fee plus priority fee.
    Modern,
}

/// Decide which fee mechanism a snapshot describes.
pub fn classify_mechanism(snapshot: &FeeSnapshot) -> Result<FeeMechanism, SubmitError> {
    match (
        snapshot.gas_price,
        snapshot.max_fee_per_gas,
        snapshot.max_priority_fee_per_gas,
    ) {
        (_, Some(_), Some(_)) => Ok(FeeMechanism::Modern),
        (Some(_), _, _) => Ok(FeeMechanism::Legacy),
        _ => Err(SubmitError::InvalidFeeData),
    }
}

/// The fee compared against the ceiling.
///
/// For EIP-1559 snapshots this recovers the base fee from
/// `max_fee = 2 * base_fee + priority_fee`.
pub fn reference_fee(snapshot: &FeeSnapshot, mechanism: FeeMechanism) -> u128 {
    match mechanism {
        FeeMechanism::Modern => {
            let max_fee = snapshot.max_fee_per_gas.unwrap_or_default();
            let priority = snapshot.max_priority_fee_per_gas.unwrap_or_default();
            max_fee.saturating_sub(priority) / 2
        }
        FeeMechanism::Legacy => snapshot.gas_price.unwrap_or_default(),
    }
}

/// Blocks submissions until network fees drop to the configured ceiling.
#[derive(Clone)]
pub struct FeePolicy {
    client: Arc<dyn ChainClient>,
    /// Ceiling in wei.
    ceiling: u128,
    poll_interval: Duration,
}

impl FeePolicy {
    pub fn new(client: Arc<dyn ChainClient>, ceiling: u128, poll_interval: Duration) -> Self {
        Self {
            client,
            ceiling,
            poll_interval,
        }
    }

    /// Poll fee data until the reference fee is at or below the ceiling.
    ///
    /// Suspends only the calling task. A failed fee fetch counts as one
    /// more poll. Only malformed fee data is an error.
    pub async fn await_acceptable_fee(&self) -> Result<FeeSnapshot, SubmitError> {
        let mut attempt: u32 = 0;
        let mut warned = false;

        loop {
            attempt += 1;

            match self.client.fee_snapshot().await {
                Ok(snapshot) => {
                    let mechanism = classify_mechanism(&snapshot)?;
                    let fee = reference_fee(&snapshot, mechanism);

                    if fee <= self.ceiling {
                        tracing::debug!(fee, ceiling = self.ceiling, ?mechanism, "Network fee acceptable");
                        return Ok(match mechanism {
                            FeeMechanism::Modern => FeeSnapshot {
                                gas_price: None,
                                ..snapshot
                            },
                            FeeMechanism::Legacy => snapshot,
                        });
                    }

                    if !warned {
                        warned = true;
                        tracing::warn!(
                            fee,
                            ceiling = self.ceiling,
                            ?mechanism,
                            "Network fee above ceiling, waiting for it to drop"
                        );
                    } else {
                        tracing::info!(
                            attempt,
                            fee,
                            ceiling = self.ceiling,
                            "Network fee still above ceiling"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Fee data unavailable, retrying");
                }
            }

            sleep(self.poll_interval).await;
        }
    }
}

impl std::fmt::Debug for FeePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeePolicy")
            .field("ceiling", &self.ceiling)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query fee data, nonces, receipts and block numbers
//! - Estimate gas and replay calls read-only
//! - Wait for confirmations with a deadline

use alloy::eips::BlockId;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::types::{
    BlockchainConfig, ChainError, ChainId, ChainResult, FeeSnapshot, Receipt,
};

/// Chain operations the submitter consumes.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current fee conditions. Legacy and EIP-1559 fields are filled when the node offers them.
    async fn fee_snapshot(&self) -> ChainResult<FeeSnapshot>;

    async fn estimate_gas(&self, request: &TransactionRequest) -> ChainResult<u64>;

    /// Next nonce for `address`, counting pending transactions.
    async fn pending_nonce(&self, address: Address) -> ChainResult<u64>;

    /// Replay `request` read-only, optionally pinned to a block.
    async fn call(&self, request: &TransactionRequest, block: Option<u64>) -> ChainResult<Bytes>;

    /// Wait until `tx_hash` is `confirmations` blocks deep, or fail with a timeout.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
        wait: Duration,
    ) -> ChainResult<Receipt>;
}

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    config: BlockchainConfig,
    timeout_duration: Duration,
    poll_interval: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Chain id verification failures are logged, not fatal, so the service
    /// can start while its node is still syncing.
    pub async fn new(config: BlockchainConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let poll_interval = Duration::from_millis(config.receipt_poll_interval_ms);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
            poll_interval,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    failovers = config.failover_urls.len(),
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Run `op` against each provider in turn.
    ///
    /// Transport failures and timeouts move on to the next provider. A node
    /// error response is returned immediately: another node would give the
    /// same verdict, and for broadcasts the message is what gets classified.
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, mut op: F) -> ChainResult<T>
    where
        F: FnMut(DynProvider) -> Fut + Send,
        Fut: Future<Output = TransportResult<T>> + Send,
        T: Send,
    {
        let mut last_error = String::from("no providers configured");
        let mut timeouts = 0;
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) if e.is_error_resp() => return Err(ChainError::from(e)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, operation, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, operation, "RPC timeout, trying next provider");
                    timeouts += 1;
                }
            }
        }
        if timeouts > 0 && timeouts == self.providers.len() {
            return Err(ChainError::RpcTimeout { operation });
        }
        Err(ChainError::AllProvidersFailed {
            operation,
            last_error,
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        self.with_failover("get_chain_id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    pub async fn get_block_number(&self) -> ChainResult<u64> {
        self.with_failover("get_block_number", |p| async move { p.get_block_number().await })
            .await
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        self.with_failover("get_transaction_receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Current legacy gas price in wei.
    pub async fn get_gas_price(&self) -> ChainResult<u128> {
        self.with_failover("get_gas_price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// Broadcast an already-signed, EIP-2718 encoded transaction.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash> {
        self.with_failover("send_raw_transaction", |p| {
            let raw = raw.clone();
            async move {
                p.send_raw_transaction(&raw)
                    .await
                    .map(|pending| *pending.tx_hash())
            }
        })
        .await
    }

}

#[async_trait]
impl ChainClient for BlockchainClient {
    async fn fee_snapshot(&self) -> ChainResult<FeeSnapshot> {
        let gas_price = self.get_gas_price().await?;
        let estimation = self
            .with_failover("estimate_eip1559_fees", |p| async move {
                p.estimate_eip1559_fees().await
            })
            .await;

        match estimation {
            Ok(fees) => Ok(FeeSnapshot {
                gas_price: Some(gas_price),
                max_fee_per_gas: Some(fees.max_fee_per_gas),
                max_priority_fee_per_gas: Some(fees.max_priority_fee_per_gas),
            }),
            Err(e) => {
                tracing::debug!(error = %e, "EIP-1559 fee estimation unavailable, using legacy gas price");
                Ok(FeeSnapshot::legacy(gas_price))
            }
        }
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> ChainResult<u64> {
        self.with_failover("estimate_gas", |p| {
            let tx = request.clone();
            async move { p.estimate_gas(tx).await }
        })
        .await
    }

    async fn pending_nonce(&self, address: Address) -> ChainResult<u64> {
        self.with_failover("get_transaction_count", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn call(&self, request: &TransactionRequest, block: Option<u64>) -> ChainResult<Bytes> {
        self.with_failover("call", |p| {
            let tx = request.clone();
            async move {
                match block {
                    Some(number) => p.call(tx).block(BlockId::number(number)).await,
                    None => p.call(tx).await,
                }
            }
        })
        .await
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
        wait: Duration,
    ) -> ChainResult<Receipt> {
        let result = timeout(wait, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed, polling again");
                        continue;
                    }
                };

                let current_block = match self.get_block_number().await {
                    Ok(block) => block,
                    Err(e) => {
                        tracing::warn!(error = %e, "Block number lookup failed, polling again");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block itself is the first confirmation.
                let depth = current_block.saturating_sub(tx_block) + 1;

                if depth >= confirmations {
                    return Receipt::from(&receipt);
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = depth,
                    required = confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        result.map_err(|_| ChainError::ConfirmationTimeout {
            tx_hash,
            waited: wait,
        })
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337, // Anvil default
            rpc_timeout_secs: 1,
            receipt_poll_interval_ms: 100,
        }
    }

    #[tokio::test]
    async fn test_client_creation_tolerates_unreachable_node() {
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_primary_url_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        assert!(BlockchainClient::new(config).await.is_err());
    }

    #[tokio::test]
    async fn test_rpc_failover_exhaustion() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        config.failover_urls.push("::bad::".to_string());

        let client = BlockchainClient::new(config).await.unwrap();
        assert_eq!(client.providers.len(), 2);

        let err = client.get_block_number().await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::AllProvidersFailed {
                operation: "get_block_number",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_silent_providers_time_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let mut config = test_config();
        config.rpc_url = format!("http://{addr}");
        config.failover_urls.push(format!("http://{addr}"));
        let client = BlockchainClient::new(config).await.unwrap();

        let err = client
            .send_raw_transaction(Bytes::from_static(&[0x01]))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                ChainError::RpcTimeout {
                    operation: "send_raw_transaction"
                }
            ),
            "{err:?}"
        );
        assert_eq!(err.kind(), crate::blockchain::types::ErrorKind::Timeout);
    }
}

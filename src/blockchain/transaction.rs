//! Transaction signing and broadcasting.
//!
//! # Responsibilities
//! - Sign fully populated requests with the service wallet
//! - Broadcast the signed bytes through the failover client

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::ChainResult;
use crate::blockchain::wallet::Wallet;

/// Signing identity able to broadcast a transaction it signs.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Address transactions are sent from.
    fn address(&self) -> Address;

    /// Sign and broadcast `request`, returning the transaction hash once the node accepts it.
    async fn send_transaction(&self, request: TransactionRequest) -> ChainResult<TxHash>;
}

/// Sender backed by a local wallet and the RPC client.
#[derive(Clone, Debug)]
pub struct TxSender {
    client: BlockchainClient,
    wallet: Wallet,
}

impl TxSender {
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }
}

#[async_trait]
impl TransactionSender for TxSender {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn send_transaction(&self, request: TransactionRequest) -> ChainResult<TxHash> {
        let nonce = request.nonce;
        let raw = self.wallet.sign_transaction(request).await?;
        let tx_hash = self.client.send_raw_transaction(raw).await?;
        tracing::debug!(tx_hash = %tx_hash, nonce = ?nonce, "Transaction broadcast");
        Ok(tx_hash)
    }
}

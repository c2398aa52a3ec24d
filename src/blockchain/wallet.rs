//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{ChainError, ChainResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "SUBMITTER_PRIVATE_KEY";

/// Signing identity for submitted transactions.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> ChainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Load wallet from `SUBMITTER_PRIVATE_KEY`.
    pub fn from_env(chain_id: u64) -> ChainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ChainError::Wallet(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key, chain_id)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a fully populated request and return its EIP-2718 encoding.
    ///
    /// The request must already carry nonce, gas limit and fee fields; the
    /// transaction type follows from which fee fields are set.
    pub async fn sign_transaction(&self, request: TransactionRequest) -> ChainResult<Bytes> {
        let request = request
            .with_from(self.address())
            .with_chain_id(self.chain_id);
        let wallet = EthereumWallet::from(self.signer.clone());
        let envelope = request
            .build(&wallet)
            .await
            .map_err(|e| ChainError::Wallet(format!("Signing failed: {}", e)))?;
        Ok(envelope.encoded_2718().into())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

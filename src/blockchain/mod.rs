//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key), config (RPC URLs)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (sign, broadcast)
//! ```
//!
//! The submission engine and monitors only see the [`ChainClient`] and
//! [`TransactionSender`] traits, so tests can script the chain.
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{BlockchainClient, ChainClient};
pub use transaction::{TransactionSender, TxSender};
pub use types::{
    BlockchainConfig, ChainError, ChainId, ChainResult, ErrorKind, FeeSnapshot, Receipt,
};
pub use wallet::Wallet;

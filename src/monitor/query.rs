//! Sources of network facts.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::ChainError;

alloy::sol! {
    interface IOperatorRegistry {
        function paused() external view returns (bool);
        function isOperatorFor(address operator, address principal) external view returns (bool);
    }
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("State query failed: {0}")]
    Chain(#[from] ChainError),

    #[error("Malformed state query response: {0}")]
    Decode(#[from] alloy::sol_types::Error),
}

/// Answers the questions the submission gates ask.
#[async_trait]
pub trait NetworkStateQuery: Send + Sync {
    /// Whether the network currently rejects state changes.
    async fn is_paused(&self) -> Result<bool, MonitorError>;

    /// Whether `operator` may act on behalf of `principal`.
    async fn is_authorized(&self, operator: Address, principal: Address)
        -> Result<bool, MonitorError>;
}

/// Reads pause and operator state from a registry contract.
#[derive(Clone)]
pub struct ContractStateQuery {
    client: Arc<dyn ChainClient>,
    registry: Address,
}

impl ContractStateQuery {
    pub fn new(client: Arc<dyn ChainClient>, registry: Address) -> Self {
        Self { client, registry }
    }

    async fn view(&self, calldata: Vec<u8>) -> Result<Bytes, MonitorError> {
        let request = TransactionRequest::default()
            .with_to(self.registry)
            .with_input(calldata);
        Ok(self.client.call(&request, None).await?)
    }
}

#[async_trait]
impl NetworkStateQuery for ContractStateQuery {
    async fn is_paused(&self) -> Result<bool, MonitorError> {
        let output = self
            .view(IOperatorRegistry::pausedCall {}.abi_encode())
            .await?;
        Ok(IOperatorRegistry::pausedCall::abi_decode_returns(&output)?)
    }

    async fn is_authorized(
        &self,
        operator: Address,
        principal: Address,
    ) -> Result<bool, MonitorError> {
        let call = IOperatorRegistry::isOperatorForCall {
            operator,
            principal,
        };
        let output = self.view(call.abi_encode()).await?;
        Ok(IOperatorRegistry::isOperatorForCall::abi_decode_returns(&output)?)
    }
}

impl std::fmt::Debug for ContractStateQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractStateQuery")
            .field("registry", &self.registry)
            .finish()
    }
}

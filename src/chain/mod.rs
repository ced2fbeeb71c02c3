//! Chain Reads
//!
//! The narrow read interface the crate needs from a node, plus the call value
//! shared by every operation this crate builds.

pub mod rpc;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use rpc::RpcChainReader;

/// A single call executed by the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    #[serde(with = "crate::wire::u256_dec")]
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Read-only access to one chain.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed bytecode at `address`; empty when nothing is deployed.
    async fn get_code(&self, address: Address) -> Result<Bytes, TransportError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TransportError>;

    async fn is_deployed(&self, address: Address) -> Result<bool, TransportError> {
        Ok(!self.get_code(address).await?.is_empty())
    }
}

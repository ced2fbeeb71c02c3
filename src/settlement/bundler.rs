//! Bundler Client
//!
//! ERC-4337 bundler access for same-chain user operations.

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::chain::rpc::JsonRpcTransport;
use crate::config::BundlerConfig;
use crate::error::{Error, SettlementError, TransportError};

/// Result of `eth_getUserOperationReceipt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    pub sender: Address,
    #[serde(with = "crate::wire::u256_dec")]
    pub nonce: U256,
    pub success: bool,
    #[serde(with = "crate::wire::u256_dec")]
    pub actual_gas_cost: U256,
    #[serde(with = "crate::wire::u256_dec")]
    pub actual_gas_used: U256,
    #[serde(default)]
    pub reason: Option<String>,
    /// The bundle transaction's receipt, as returned by the node.
    #[serde(default)]
    pub receipt: Value,
}

impl UserOperationReceipt {
    pub fn transaction_hash(&self) -> Option<B256> {
        self.receipt
            .get("transactionHash")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Source of user operation receipts.
#[async_trait]
pub trait ReceiptProvider: Send + Sync {
    /// The receipt, or `None` while the operation is not yet included.
    async fn get_receipt(&self, hash: B256) -> Result<Option<UserOperationReceipt>, TransportError>;

    /// Blocks until the receipt exists or the provider's receipt timeout fires.
    async fn wait_for_receipt(&self, hash: B256) -> Result<UserOperationReceipt, Error>;
}

/// JSON-RPC bundler client.
#[derive(Debug)]
pub struct BundlerClient {
    transport: JsonRpcTransport,
    poll_interval: Duration,
    receipt_timeout: Duration,
}

impl BundlerClient {
    /// Creates a bundler client.
    ///
    /// # Arguments
    ///
    /// * `url` - Bundler JSON-RPC endpoint
    /// * `poll_interval` - Delay between receipt queries
    /// * `receipt_timeout` - Total time to wait for a receipt
    pub fn new(
        url: &str,
        poll_interval: Duration,
        receipt_timeout: Duration,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            transport: JsonRpcTransport::new(url, Duration::from_secs(30))?,
            poll_interval,
            receipt_timeout,
        })
    }

    pub fn from_config(config: &BundlerConfig) -> Result<Self, TransportError> {
        Self::new(
            &config.url,
            Duration::from_millis(config.receipt_poll_interval_ms),
            Duration::from_millis(config.receipt_timeout_ms),
        )
    }
}

#[async_trait]
impl ReceiptProvider for BundlerClient {
    async fn get_receipt(&self, hash: B256) -> Result<Option<UserOperationReceipt>, TransportError> {
        self.transport
            .request("eth_getUserOperationReceipt", vec![json!(hash)])
            .await
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<UserOperationReceipt, Error> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.get_receipt(hash).await? {
                info!(
                    "User operation {} included (success: {})",
                    hash, receipt.success
                );
                return Ok(receipt);
            }

            let waited = started.elapsed();
            if waited >= self.receipt_timeout {
                return Err(SettlementError::ReceiptTimeout {
                    hash,
                    waited_ms: waited.as_millis() as u64,
                }
                .into());
            }
            debug!("No receipt yet for user operation {}", hash);
            sleep(self.poll_interval.min(self.receipt_timeout - waited)).await;
        }
    }
}

//! JSON-RPC Client
//!
//! Minimal JSON-RPC 2.0 plumbing over reqwest, shared by the node reader and
//! the bundler client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::ChainReader;
use crate::error::TransportError;

// ============================================================================
// WIRE STRUCTURES
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

// ============================================================================
// TRANSPORT
// ============================================================================

/// A JSON-RPC endpoint.
#[derive(Debug)]
pub(crate) struct JsonRpcTransport {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub(crate) fn new(url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| TransportError::Http {
                url: url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request. A `null` result is returned as `None`.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Option<T>, TransportError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        debug!("JSON-RPC {} -> {}", method, self.url);

        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: self.url.clone(),
                source,
            })?
            .json()
            .await
            .map_err(|e| TransportError::Decode {
                url: self.url.clone(),
                message: format!("failed to parse {method} response: {e}"),
            })?;

        if let Some(error) = response.error {
            return Err(TransportError::Rpc {
                url: self.url.clone(),
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result)
    }
}

// ============================================================================
// NODE READER
// ============================================================================

/// [`ChainReader`] backed by a node's JSON-RPC API.
#[derive(Debug)]
pub struct RpcChainReader {
    transport: JsonRpcTransport,
}

impl RpcChainReader {
    /// Creates a reader for the node at `rpc_url`.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - Node endpoint (e.g. "http://127.0.0.1:8545")
    /// * `timeout` - Per-request timeout
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            transport: JsonRpcTransport::new(rpc_url, timeout)?,
        })
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    async fn bytes_result(&self, method: &str, params: Vec<Value>) -> Result<Bytes, TransportError> {
        self.transport
            .request::<Bytes>(method, params)
            .await?
            .ok_or_else(|| TransportError::Decode {
                url: self.transport.url().to_string(),
                message: format!("{method} returned no result"),
            })
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn get_code(&self, address: Address) -> Result<Bytes, TransportError> {
        self.bytes_result("eth_getCode", vec![json!(address), json!("latest")])
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TransportError> {
        self.bytes_result(
            "eth_call",
            vec![json!({ "to": to, "data": data }), json!("latest")],
        )
        .await
    }
}

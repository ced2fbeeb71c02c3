//! Orchestrator API Client
//!
//! HTTP client for the intent orchestrator: submits signed intent operations,
//! reports their status and computes routes for new intents.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{BundleResult, IntentOpStatus};
use crate::chain::Call;
use crate::config::OrchestratorConfig;
use crate::error::TransportError;
use crate::intent::IntentOp;

const SERVICE: &str = "orchestrator";
const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// API RESPONSE WRAPPER
// ============================================================================

/// Standardized response structure of the orchestrator API.
///
/// ```json
/// {
///   "success": true|false,
///   "data": <payload>|null,
///   "error": <message>|null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

// ============================================================================
// REQUEST / RESPONSE STRUCTURES
// ============================================================================

/// Body of `POST /intent-operations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIntentOp {
    pub intent_op: IntentOp,
    /// One signature per origin element, in element order.
    pub origin_signatures: Vec<Bytes>,
    pub destination_signature: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    id: String,
}

/// A token the account wants on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub token_address: Address,
    #[serde(with = "crate::wire::u256_dec")]
    pub amount: U256,
}

/// Body of `POST /intents/route`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub account: Address,
    pub destination_chain_id: u64,
    pub token_requests: Vec<TokenRequest>,
    pub destination_executions: Vec<Call>,
    /// Restricts funding to these chains.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_chain_ids: Option<Vec<u64>>,
}

/// Route chosen by the orchestrator: the intent the account must sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRoute {
    pub intent_op: IntentOp,
}

// ============================================================================
// ORCHESTRATOR API
// ============================================================================

/// Orchestrator operations the crate depends on.
#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    async fn submit_intent_op(&self, op: &SignedIntentOp) -> Result<BundleResult, TransportError>;

    async fn intent_op_status(&self, id: &str) -> Result<IntentOpStatus, TransportError>;

    async fn route(&self, request: &RouteRequest) -> Result<IntentRoute, TransportError>;
}

/// reqwest-backed [`OrchestratorApi`].
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OrchestratorClient {
    /// Creates a new orchestrator client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the orchestrator (e.g. "https://orchestrator.example")
    /// * `api_key` - Value sent in the `x-api-key` header, if any
    /// * `timeout` - Per-request timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| TransportError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    /// Builds a client from configuration, reading the API key from the
    /// configured environment variable.
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, TransportError> {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        Self::new(
            config.url.clone(),
            api_key,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Sends a request and unwraps the [`ApiResponse`] envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, TransportError> {
        let response = self
            .with_key(request)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|source| TransportError::Http {
            url: url.to_string(),
            source,
        })?;

        let parsed: Result<ApiResponse<T>, _> = serde_json::from_str(&body);
        match parsed {
            Ok(envelope) if status.is_success() && envelope.success => {
                envelope.data.ok_or_else(|| TransportError::Decode {
                    url: url.to_string(),
                    message: "response has no data".to_string(),
                })
            }
            Ok(envelope) => Err(TransportError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message: envelope
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            }),
            Err(_) if !status.is_success() => Err(TransportError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(TransportError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl OrchestratorApi for OrchestratorClient {
    async fn submit_intent_op(&self, op: &SignedIntentOp) -> Result<BundleResult, TransportError> {
        let url = format!("{}/intent-operations", self.base_url);
        let response: SubmitResponse = self.send(self.client.post(&url).json(op), &url).await?;
        info!("Intent operation submitted: {}", response.id);
        Ok(BundleResult::Bundle { id: response.id })
    }

    async fn intent_op_status(&self, id: &str) -> Result<IntentOpStatus, TransportError> {
        let url = format!("{}/intent-operation/{}", self.base_url, id);
        let status: IntentOpStatus = self.send(self.client.get(&url), &url).await?;
        debug!("Intent operation {} is {}", id, status.status);
        Ok(status)
    }

    async fn route(&self, request: &RouteRequest) -> Result<IntentRoute, TransportError> {
        let url = format!("{}/intents/route", self.base_url);
        self.send(self.client.post(&url).json(request), &url).await
    }
}

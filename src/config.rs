//! Configuration Management Module
//!
//! Loads the collaborator endpoints and tuning knobs the crate needs from a
//! TOML file: orchestrator, bundler, settlement polling, chains and the
//! account vendor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::account::AccountKind;
use crate::error::TransportError;
use crate::settlement::{
    BundlerClient, OrchestratorClient, PollPolicy, ReceiptProvider, SettlementTracker,
};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "ACCOUNT_SDK_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/account.toml";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure.
///
/// This structure holds configuration for:
/// - Orchestrator connection
/// - Bundler connection and receipt polling
/// - Settlement poll policy
/// - Chains (use [[chain]] in TOML for multiple)
/// - Account vendor and deployment parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    pub orchestrator: OrchestratorConfig,
    pub bundler: BundlerConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(rename = "chain", default)]
    pub chains: Vec<ChainConfig>,
    pub account: AccountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Orchestrator API base URL (e.g., "https://orchestrator.example")
    pub url: String,
    /// Environment variable holding the API key, sent as `x-api-key`
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Default bundler JSON-RPC endpoint
    pub url: String,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

/// Orchestrator poll policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub poll_interval_ms: u64,
    /// Multiplier applied to the interval after every poll
    pub backoff_factor: f64,
    pub max_poll_interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            backoff_factor: 1.5,
            max_poll_interval_ms: 10_000,
            max_attempts: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// Node RPC endpoint
    pub rpc_url: String,
    /// Bundler for this chain; falls back to `[bundler].url`
    #[serde(default)]
    pub bundler_url: Option<String>,
}

/// Smart account vendor and CREATE2 parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub kind: AccountKind,
    pub factory: Address,
    pub init_code_hash: B256,
    /// Whether accounts are deployed with the smart sessions validator
    #[serde(default)]
    pub sessions_enabled: bool,
    /// Vendor bootstrap contract (Nexus bootstrap, Safe singleton)
    #[serde(default)]
    pub bootstrap: Option<Address>,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

fn default_receipt_timeout_ms() -> u64 {
    120_000
}

impl SdkConfig {
    /// Loads configuration from a TOML file.
    ///
    /// This function:
    /// 1. Uses the provided path, `ACCOUNT_SDK_CONFIG_PATH`, or `config/account.toml`
    /// 2. Parses the file
    /// 3. Validates the configuration
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to the config file
    ///
    /// # Returns
    ///
    /// * `Ok(SdkConfig)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - File missing, unparsable or invalid
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if !std::path::Path::new(&config_path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/account.template.toml config/account.toml\n\
                Then edit config/account.toml with your actual values.",
                config_path
            ));
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration in {}", config_path))?;
        Ok(config)
    }

    /// Convenience method equivalent to `load_from_path(None)`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: SdkConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks:
    /// - Every URL parses
    /// - Poll intervals are positive and below their caps
    /// - Backoff factor is at least 1.0 and at least one poll is allowed
    /// - Chain ids are unique
    pub fn validate(&self) -> anyhow::Result<()> {
        check_url("orchestrator.url", &self.orchestrator.url)?;
        check_url("bundler.url", &self.bundler.url)?;

        if self.bundler.receipt_poll_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: bundler.receipt_poll_interval_ms must be positive"
            ));
        }
        if self.bundler.receipt_timeout_ms < self.bundler.receipt_poll_interval_ms {
            return Err(anyhow::anyhow!(
                "Configuration error: bundler.receipt_timeout_ms ({}) is shorter than the poll interval ({})",
                self.bundler.receipt_timeout_ms,
                self.bundler.receipt_poll_interval_ms
            ));
        }

        let tracker = &self.tracker;
        if tracker.poll_interval_ms == 0 || tracker.poll_interval_ms > tracker.max_poll_interval_ms {
            return Err(anyhow::anyhow!(
                "Configuration error: tracker.poll_interval_ms must be in 1..={}",
                tracker.max_poll_interval_ms
            ));
        }
        if tracker.backoff_factor < 1.0 {
            return Err(anyhow::anyhow!(
                "Configuration error: tracker.backoff_factor {} must be at least 1.0",
                tracker.backoff_factor
            ));
        }
        if tracker.max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: tracker.max_attempts must be at least 1"
            ));
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain_id) {
                return Err(anyhow::anyhow!(
                    "Configuration error: chain {} is configured twice",
                    chain.chain_id
                ));
            }
            check_url(&format!("chain {} rpc_url", chain.chain_id), &chain.rpc_url)?;
            if let Some(bundler) = &chain.bundler_url {
                check_url(&format!("chain {} bundler_url", chain.chain_id), bundler)?;
            }
        }

        Ok(())
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Bundler endpoint for `chain_id`.
    pub fn bundler_url(&self, chain_id: u64) -> &str {
        self.chain(chain_id)
            .and_then(|c| c.bundler_url.as_deref())
            .unwrap_or(&self.bundler.url)
    }

    /// Builds a settlement tracker with one bundler per configured chain.
    pub fn settlement_tracker(&self) -> Result<SettlementTracker, TransportError> {
        let orchestrator = Arc::new(OrchestratorClient::from_config(&self.orchestrator)?);
        let mut bundlers: HashMap<u64, Arc<dyn ReceiptProvider>> = HashMap::new();
        for chain in &self.chains {
            let bundler = BundlerConfig {
                url: self.bundler_url(chain.chain_id).to_string(),
                ..self.bundler.clone()
            };
            bundlers.insert(chain.chain_id, Arc::new(BundlerClient::from_config(&bundler)?));
        }

        let tracker = SettlementTracker::new(orchestrator, PollPolicy::from_config(&self.tracker));
        Ok(bundlers
            .into_iter()
            .fold(tracker, |tracker, (chain_id, bundler)| {
                tracker.with_bundler(chain_id, bundler)
            }))
    }
}

fn check_url(field: &str, value: &str) -> anyhow::Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .with_context(|| format!("Configuration error: {} is not a valid URL: {}", field, value))
}

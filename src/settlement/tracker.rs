//! Poll loop from submission to a terminal state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::orchestrator::OrchestratorApi;
use super::{BundleResult, ReceiptProvider, SettlementOutcome};
use crate::config::TrackerConfig;
use crate::error::{ConfigError, Error, SettlementError};

/// How often and how long the orchestrator is polled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub interval: Duration,
    /// Multiplier applied to the delay after every poll (1.0 = fixed).
    pub backoff_factor: f64,
    pub max_interval: Duration,
    /// Polls made before giving up; at least one.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff_factor: 1.5,
            max_interval: Duration::from_secs(10),
            max_attempts: 120,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            backoff_factor: config.backoff_factor,
            max_interval: Duration::from_millis(config.max_poll_interval_ms),
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Delay after the `attempt`-th poll (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(attempt.min(64) as i32);
        let millis = self.interval.as_millis() as f64 * factor;
        let capped = millis.min(self.max_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Waits for submissions to settle.
///
/// Holds no background task: dropping the future returned by
/// [`SettlementTracker::wait`] stops polling.
pub struct SettlementTracker {
    orchestrator: Arc<dyn OrchestratorApi>,
    /// Bundler per chain id, for user operations.
    bundlers: HashMap<u64, Arc<dyn ReceiptProvider>>,
    policy: PollPolicy,
}

impl SettlementTracker {
    pub fn new(orchestrator: Arc<dyn OrchestratorApi>, policy: PollPolicy) -> Self {
        Self {
            orchestrator,
            bundlers: HashMap::new(),
            policy,
        }
    }

    pub fn with_bundler(mut self, chain_id: u64, bundler: Arc<dyn ReceiptProvider>) -> Self {
        self.bundlers.insert(chain_id, bundler);
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Waits until `result` settles.
    ///
    /// # Returns
    ///
    /// * `Ok(SettlementOutcome)` - Terminal, non-failing status or receipt
    /// * `Err(Error::Settlement)` - `FAILED`/`EXPIRED`, poll budget exhausted or receipt timeout
    /// * `Err(Error::Transport)` - Orchestrator or bundler unreachable
    pub async fn wait(&self, result: &BundleResult) -> Result<SettlementOutcome, Error> {
        match result {
            BundleResult::Bundle { id } => self.wait_bundle(id).await,
            BundleResult::UserOperation {
                hash, target_chain, ..
            } => {
                let bundler = self
                    .bundlers
                    .get(target_chain)
                    .ok_or(ConfigError::UnknownChain {
                        chain_id: *target_chain,
                    })?;
                let receipt = bundler.wait_for_receipt(*hash).await?;
                Ok(SettlementOutcome::UserOperation(receipt))
            }
        }
    }

    async fn wait_bundle(&self, id: &str) -> Result<SettlementOutcome, Error> {
        let mut attempts = 0u32;
        loop {
            let status = self.orchestrator.intent_op_status(id).await?;
            attempts += 1;
            debug!("Bundle {} poll {}: {}", id, attempts, status.status);

            if !status.status.is_pending() {
                if status.status.is_failure() {
                    warn!("Bundle {} ended with status {}", id, status.status);
                    return Err(SettlementError::Terminal {
                        id: id.to_string(),
                        status: Box::new(status),
                    }
                    .into());
                }
                info!("Bundle {} settled with status {}", id, status.status);
                return Ok(SettlementOutcome::Bundle(status));
            }

            if attempts >= self.policy.max_attempts {
                warn!("Bundle {} still pending after {} polls", id, attempts);
                return Err(SettlementError::Timeout {
                    id: id.to_string(),
                    attempts,
                    last_status: status.status,
                }
                .into());
            }
            sleep(self.policy.delay(attempts - 1)).await;
        }
    }
}

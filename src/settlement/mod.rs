//! Settlement Tracker
//!
//! Follows a submitted authorization until it settles.
//!
//! Flow:
//! 1. **Submitted**: the caller holds a [`BundleResult`], the only state kept
//!    between submission and polling.
//! 2. **Pending**: the orchestrator reports `PENDING` (bundles) or the bundler
//!    has no receipt yet (user operations).
//! 3. **Terminal**: any other bundle status, or a receipt. `FAILED` and
//!    `EXPIRED` surface as [`SettlementError::Terminal`](crate::error::SettlementError).

pub mod bundler;
pub mod orchestrator;
pub mod tracker;

use std::fmt;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

pub use bundler::{BundlerClient, ReceiptProvider, UserOperationReceipt};
pub use orchestrator::{OrchestratorApi, OrchestratorClient};
pub use tracker::{PollPolicy, SettlementTracker};

/// Handle returned by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BundleResult {
    /// Cross-chain bundle accepted by the orchestrator.
    Bundle { id: String },
    /// Same-chain user operation handed to a bundler.
    UserOperation {
        hash: B256,
        #[serde(rename = "sourceChain")]
        source_chain: u64,
        #[serde(rename = "targetChain")]
        target_chain: u64,
    },
}

/// Orchestrator-reported bundle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleStatus {
    Pending,
    Completed,
    PartiallyCompleted,
    Filled,
    Expired,
    Failed,
    #[serde(other)]
    Unknown,
}

impl BundleStatus {
    pub fn is_pending(self) -> bool {
        matches!(self, BundleStatus::Pending)
    }

    /// Terminal statuses reported as errors.
    pub fn is_failure(self) -> bool {
        matches!(self, BundleStatus::Failed | BundleStatus::Expired)
    }
}

impl fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BundleStatus::Pending => "PENDING",
            BundleStatus::Completed => "COMPLETED",
            BundleStatus::PartiallyCompleted => "PARTIALLY_COMPLETED",
            BundleStatus::Filled => "FILLED",
            BundleStatus::Expired => "EXPIRED",
            BundleStatus::Failed => "FAILED",
            BundleStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Settlement of one origin-chain claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub chain_id: u64,
    pub status: BundleStatus,
    #[serde(default)]
    pub claim_transaction_hash: Option<B256>,
}

/// Body of `GET /intent-operation/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentOpStatus {
    pub status: BundleStatus,
    #[serde(default)]
    pub fill_transaction_hash: Option<B256>,
    #[serde(default)]
    pub fill_timestamp: Option<u64>,
    #[serde(default)]
    pub claims: Vec<Claim>,
}

/// What a settled submission resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    Bundle(IntentOpStatus),
    UserOperation(UserOperationReceipt),
}

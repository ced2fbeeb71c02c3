//! Shared test helpers for smart account integration tests
//!
//! This module provides constants, fixtures and scripted collaborators used
//! by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use smart_account_core::chain::Call;
use smart_account_core::settlement::orchestrator::{IntentRoute, RouteRequest, SignedIntentOp};
use smart_account_core::settlement::{ReceiptProvider, UserOperationReceipt};
use smart_account_core::{
    BundleResult, BundleStatus, Error, IntentElement, IntentMandate, IntentOp, IntentOpStatus,
    LocalEcdsaAccount, OpBundle, OrchestratorApi, PollPolicy, SettlementError, TransportError,
};

// ============================================================================
// CONSTANTS
// ============================================================================

// --------------------------------- IDs ----------------------------------

/// Dummy bundle id assigned by the orchestrator
pub const DUMMY_BUNDLE_ID: &str = "bundle-0001";

/// Dummy user operation hash (64 hex characters)
pub const DUMMY_USER_OP_HASH: &str =
    "0x00000000000000000000000000000000000000000000000000000000000000aa";

/// Dummy bundle transaction hash (64 hex characters)
pub const DUMMY_TX_HASH: &str =
    "0x00000000000000000000000000000000000000000000000000000000000000bb";

// -------------------------------- KEYS ----------------------------------

/// Well-known test private key
pub const TEST_PRIVATE_KEY: &str =
    "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Address of TEST_PRIVATE_KEY
pub const TEST_OWNER_ADDRESS: Address = address!("2c7536e3605d9c16a7a3d7b1898e529396a65c23");

/// Second test private key
pub const SECOND_PRIVATE_KEY: &str =
    "0x0123456789012345678901234567890123456789012345678901234567890123";

// ----------------------------- ACCOUNTS ---------------------------------

/// Dummy smart account address
pub const DUMMY_ACCOUNT: Address = address!("1111111111111111111111111111111111111111");

/// Dummy arbiter address
pub const DUMMY_ARBITER: Address = address!("2222222222222222222222222222222222222222");

/// Dummy call target
pub const DUMMY_TARGET: Address = address!("3333333333333333333333333333333333333333");

/// USDC on its default lock tag (12-byte tag over the token address)
pub const USDC_TOKEN_ID: &str =
    "0x000000000000000000000001a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

// ============================================================================
// FIXTURES
// ============================================================================

pub fn test_owner() -> Arc<LocalEcdsaAccount> {
    Arc::new(LocalEcdsaAccount::from_hex(TEST_PRIVATE_KEY).unwrap())
}

pub fn second_owner() -> Arc<LocalEcdsaAccount> {
    Arc::new(LocalEcdsaAccount::from_hex(SECOND_PRIVATE_KEY).unwrap())
}

/// Intent from Base (8453) to Optimism (10) moving 1 USDC.
pub fn intent_op() -> IntentOp {
    let usdc: U256 = USDC_TOKEN_ID.parse().unwrap();
    IntentOp {
        sponsor: DUMMY_ACCOUNT,
        nonce: U256::from(7),
        expires: U256::from(1_900_000_000u64),
        elements: vec![IntentElement {
            arbiter: DUMMY_ARBITER,
            chain_id: 8453,
            ids_and_amounts: vec![(usdc, U256::from(1_000_000u64))],
            mandate: IntentMandate {
                recipient: DUMMY_ACCOUNT,
                token_out: vec![(usdc, U256::from(995_000u64))],
                destination_chain_id: 10,
                fill_deadline: U256::from(1_800_000_000u64),
                min_gas: 100_000,
                pre_claim_ops: OpBundle::default(),
                destination_ops: OpBundle::new(
                    B256::ZERO,
                    vec![Call::new(DUMMY_TARGET, vec![0xca, 0xfe])],
                ),
                qualifier: Bytes::new(),
            },
        }],
    }
}

pub fn status(status: BundleStatus) -> IntentOpStatus {
    IntentOpStatus {
        status,
        fill_transaction_hash: None,
        fill_timestamp: None,
        claims: Vec::new(),
    }
}

/// Poll policy with millisecond delays so tests run fast.
pub fn fast_policy(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        backoff_factor: 2.0,
        max_interval: Duration::from_millis(4),
        max_attempts,
    }
}

/// `eth_getUserOperationReceipt` result as a bundler returns it.
pub fn receipt_json(success: bool) -> Value {
    json!({
        "userOpHash": DUMMY_USER_OP_HASH,
        "sender": DUMMY_ACCOUNT,
        "nonce": "0x1",
        "success": success,
        "actualGasCost": "0x5208",
        "actualGasUsed": "0x5208",
        "receipt": { "transactionHash": DUMMY_TX_HASH }
    })
}

pub fn receipt(success: bool) -> UserOperationReceipt {
    serde_json::from_value(receipt_json(success)).unwrap()
}

// ============================================================================
// SCRIPTED ORCHESTRATOR
// ============================================================================

/// Orchestrator that answers status polls from a script. The last scripted
/// status repeats once the script is exhausted.
pub struct ScriptedOrchestrator {
    statuses: Mutex<VecDeque<Result<IntentOpStatus, TransportError>>>,
    last: Mutex<Option<IntentOpStatus>>,
    status_calls: AtomicUsize,
}

impl ScriptedOrchestrator {
    pub fn new(statuses: Vec<BundleStatus>) -> Self {
        Self::with_results(statuses.into_iter().map(|s| Ok(status(s))).collect())
    }

    pub fn with_results(results: Vec<Result<IntentOpStatus, TransportError>>) -> Self {
        Self {
            statuses: Mutex::new(results.into()),
            last: Mutex::new(None),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrchestratorApi for ScriptedOrchestrator {
    async fn submit_intent_op(&self, _op: &SignedIntentOp) -> Result<BundleResult, TransportError> {
        Ok(BundleResult::Bundle {
            id: DUMMY_BUNDLE_ID.to_string(),
        })
    }

    async fn intent_op_status(&self, _id: &str) -> Result<IntentOpStatus, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last.lock().unwrap() = Some(status.clone());
                Ok(status)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| status(BundleStatus::Pending))),
        }
    }

    async fn route(&self, _request: &RouteRequest) -> Result<IntentRoute, TransportError> {
        Ok(IntentRoute {
            intent_op: intent_op(),
        })
    }
}

// ============================================================================
// SCRIPTED BUNDLER
// ============================================================================

/// Bundler whose receipt appears after `pending_polls` empty answers.
pub struct ScriptedBundler {
    pending_polls: usize,
    calls: AtomicUsize,
}

impl ScriptedBundler {
    pub fn new(pending_polls: usize) -> Self {
        Self {
            pending_polls,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptProvider for ScriptedBundler {
    async fn get_receipt(&self, _hash: B256) -> Result<Option<UserOperationReceipt>, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.pending_polls {
            Ok(None)
        } else {
            Ok(Some(receipt(true)))
        }
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<UserOperationReceipt, Error> {
        for _ in 0..=self.pending_polls {
            if let Some(receipt) = self.get_receipt(hash).await? {
                return Ok(receipt);
            }
        }
        Err(SettlementError::ReceiptTimeout { hash, waited_ms: 0 }.into())
    }
}

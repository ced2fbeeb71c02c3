//! Session Lifecycle
//!
//! Delegated, policy-scoped signing permissions on top of the smart sessions
//! validator.
//!
//! A session is constructed client-side, identified by its permission id,
//! enabled on-chain once per account and then used for signing until its
//! policies reject it. Expiry is enforced on-chain only; nothing here tracks
//! time.
//!
//! - [`permission`]: ABI form of a session and its permission id
//! - [`erc7739`]: nested typed-data envelopes for ERC-1271 signatures
//! - [`signature`]: `USE` / `ENABLE` signature encodings
//! - [`lifecycle`]: enable state machine

pub mod erc7739;
pub mod lifecycle;
pub mod permission;
pub mod signature;

use alloy_primitives::{address, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::signer::OwnerSet;

pub use lifecycle::{
    EnableOutcome, Operation, OperationSubmitter, SessionLifecycle, SessionState,
};
pub use permission::permission_id;
pub use signature::SessionMode;

// ============================================================================
// POLICIES
// ============================================================================

pub const SUDO_POLICY_ADDRESS: Address = address!("0000003111cd8e92337c100f22b7a9dbf8dee301");
pub const TIME_FRAME_POLICY_ADDRESS: Address = address!("8177451511de0577b911c254e9551d981c26dc72");
pub const USAGE_LIMIT_POLICY_ADDRESS: Address = address!("1f34ef8311345a3a4a4566af321b313052f51493");
pub const VALUE_LIMIT_POLICY_ADDRESS: Address = address!("730da93267e7e513e932301b47f2ac7d062abc83");
pub const SPENDING_LIMITS_POLICY_ADDRESS: Address =
    address!("00000088d48cf102a8cdb0137a9b173f957c6343");

/// Marks an action that applies to any target.
pub const FALLBACK_TARGET: Address = address!("0000000000000000000000000000000000000001");
/// Marks an action that applies to any selector.
pub const FALLBACK_SELECTOR: FixedBytes<4> = FixedBytes([0, 0, 0, 1]);

/// A policy contract and its per-session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub address: Address,
    pub init_data: Bytes,
}

impl Policy {
    pub fn new(address: Address, init_data: impl Into<Bytes>) -> Self {
        Self {
            address,
            init_data: init_data.into(),
        }
    }

    /// Allows everything.
    pub fn sudo() -> Self {
        Self::new(SUDO_POLICY_ADDRESS, Bytes::new())
    }

    /// `uint128 validUntil ‖ uint128 validAfter` (0 = unbounded).
    pub fn time_frame(valid_until: u64, valid_after: u64) -> Self {
        let mut data = Vec::with_capacity(32);
        data.extend_from_slice(&u128::from(valid_until).to_be_bytes());
        data.extend_from_slice(&u128::from(valid_after).to_be_bytes());
        Self::new(TIME_FRAME_POLICY_ADDRESS, data)
    }

    /// `uint128 limit` on the number of uses.
    pub fn usage_limit(limit: u128) -> Self {
        Self::new(USAGE_LIMIT_POLICY_ADDRESS, limit.to_be_bytes().to_vec())
    }

    /// `abi.encode(uint256 limit)` on native value per call.
    pub fn value_limit(limit: U256) -> Self {
        Self::new(VALUE_LIMIT_POLICY_ADDRESS, limit.abi_encode())
    }

    /// `abi.encode(address[] tokens, uint256[] limits)`.
    pub fn spending_limits(limits: &[(Address, U256)]) -> Self {
        let (tokens, amounts): (Vec<Address>, Vec<U256>) = limits.iter().copied().unzip();
        Self::new(
            SPENDING_LIMITS_POLICY_ADDRESS,
            (tokens, amounts).abi_encode_params(),
        )
    }
}

/// A call target the session may invoke, with its policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub target: Address,
    pub selector: FixedBytes<4>,
    pub policies: Vec<Policy>,
}

impl Action {
    /// Any target, any selector, no restriction.
    pub fn fallback() -> Self {
        Self {
            target: FALLBACK_TARGET,
            selector: FALLBACK_SELECTOR,
            policies: vec![Policy::sudo()],
        }
    }
}

/// One EIP-712 content type an ERC-1271 session signature may cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedContent {
    pub app_domain_separator: B256,
    pub content_names: Vec<String>,
}

/// Policies applied to ERC-1271 (message) signatures made with the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningPolicy {
    pub allowed_contents: Vec<AllowedContent>,
    pub policies: Vec<Policy>,
}

// ============================================================================
// SESSION
// ============================================================================

/// A delegated signing permission.
#[derive(Debug, Clone)]
pub struct Session {
    /// Keys the session signs with.
    pub owners: OwnerSet,
    /// Chain the session is meant for, when it is chain-specific.
    pub chain_id: Option<u64>,
    /// Policies checked on every user operation.
    pub policies: Vec<Policy>,
    /// Allowed calls; empty means [`Action::fallback`].
    pub actions: Vec<Action>,
    pub signing: Option<SigningPolicy>,
    pub salt: B256,
    pub permit_paymaster: bool,
}

impl Session {
    pub fn new(owners: OwnerSet) -> Self {
        Self {
            owners,
            chain_id: None,
            policies: Vec::new(),
            actions: Vec::new(),
            signing: None,
            salt: B256::ZERO,
            permit_paymaster: false,
        }
    }

    pub fn with_salt(mut self, salt: B256) -> Self {
        self.salt = salt;
        self
    }

    pub fn with_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_signing(mut self, signing: SigningPolicy) -> Self {
        self.signing = Some(signing);
        self
    }
}

/// Per-chain digest of a session inside a multi-chain enable signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDigest {
    pub chain_id: u64,
    pub session_digest: B256,
}

/// Everything needed to enable a session in the same operation that uses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnableData {
    /// Position of the current chain in `chain_digests`.
    pub chain_digest_index: u8,
    pub chain_digests: Vec<ChainDigest>,
    /// `ownerValidator ‖ ownerSignature` over the enable typed data.
    pub permission_enable_sig: Bytes,
}

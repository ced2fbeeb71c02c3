//! Error Types
//!
//! Every failure the crate can surface is a distinct, matchable type so callers
//! never have to parse error strings:
//!
//! - [`ConfigError`]: invalid caller input, detected before any signing call
//! - [`CapabilityError`]: a supplied signer cannot perform the requested operation
//! - [`EncodeError`]: a value cannot be represented in the on-chain layout
//! - [`SettlementError`]: a submitted bundle reached a failing terminal state
//! - [`TransportError`]: HTTP / JSON-RPC failures (never retried by this crate)

use std::fmt;

use alloy_primitives::{Address, B256};
use thiserror::Error;

use crate::settlement::{BundleStatus, IntentOpStatus};

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

/// Invalid or inconsistent caller configuration.
///
/// Always recoverable by fixing the input; raised eagerly, before any
/// signing callback is invoked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("account has no owners configured")]
    MissingOwners,

    #[error("account is not set up with smart sessions, cannot sign with a session")]
    SessionsNotEnabled,

    #[error("account has no recovery guardians installed, cannot sign as guardians")]
    GuardiansNotInstalled,

    #[error("signer set nesting exceeds the maximum depth of {max}")]
    NestingTooDeep { max: usize },

    #[error("owner {label} cannot be used as {role}")]
    UnsupportedOwner { label: String, role: &'static str },

    #[error("intent must contain at least one element")]
    EmptyIntent,

    #[error("chain {chain_id} is not configured")]
    UnknownChain { chain_id: u64 },

    #[error("{0}")]
    Invalid(String),
}

// ============================================================================
// CAPABILITY ERRORS
// ============================================================================

/// A signing capability a caller-supplied account may or may not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// EIP-191 signing of a raw 32-byte hash
    SignMessage,
    /// EIP-712 typed-data signing
    SignTypedData,
    /// WebAuthn assertion over a challenge
    SignWebAuthn,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::SignMessage => "message signing",
            Capability::SignTypedData => "typed data signing",
            Capability::SignWebAuthn => "webauthn signing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The signer does not implement the requested capability at all.
    #[error("signer {account} does not support {capability}")]
    Missing {
        capability: Capability,
        account: String,
    },

    /// The signer implements the capability but the signing callback failed.
    #[error("signer {account} failed during {capability}: {message}")]
    Failed {
        capability: Capability,
        account: String,
        message: String,
    },
}

impl CapabilityError {
    /// The capability that was requested when the error occurred.
    pub fn capability(&self) -> Capability {
        match self {
            CapabilityError::Missing { capability, .. }
            | CapabilityError::Failed { capability, .. } => *capability,
        }
    }
}

// ============================================================================
// ENCODING ERRORS
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid threshold {threshold} for {count} signer(s)")]
    InvalidThreshold { threshold: u64, count: usize },

    #[error("duplicate owner {0}")]
    DuplicateOwner(Address),

    #[error("invalid typed data: {0}")]
    TypedData(String),
}

// ============================================================================
// SETTLEMENT ERRORS
// ============================================================================

#[derive(Debug, Error, Clone)]
pub enum SettlementError {
    /// The bundle reached `Failed` or `Expired`. Carries the last status payload.
    #[error("bundle {id} reached terminal status {}", .status.status)]
    Terminal { id: String, status: Box<IntentOpStatus> },

    /// The poll budget ran out while the bundle was still pending.
    #[error("bundle {id} still {last_status} after {attempts} polls")]
    Timeout {
        id: String,
        attempts: u32,
        last_status: BundleStatus,
    },

    /// The bundler never produced a receipt within its own receipt timeout.
    #[error("user operation {hash} has no receipt after {waited_ms}ms")]
    ReceiptTimeout { hash: B256, waited_ms: u64 },
}

// ============================================================================
// TRANSPORT ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} API error (status {status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON-RPC error from {url}: {message} (code: {code})")]
    Rpc { url: String, code: i64, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

// ============================================================================
// UNIFIED ERROR
// ============================================================================

/// Top-level error returned by operations spanning several concerns.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Signing Accounts
//!
//! [`SigningAccount`] is the capability interface callers implement to plug a
//! key into the signer model: a local key, a hardware passkey or a remote
//! signing service. Each capability has a default implementation that fails
//! with [`CapabilityError::Missing`], so an implementation only overrides what
//! it can actually do.
//!
//! [`LocalEcdsaAccount`] is an in-memory secp256k1 implementation for tests and
//! tooling.

use std::fmt;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use super::webauthn::{PasskeyCredential, WebAuthnAssertion};
use crate::error::{Capability, CapabilityError, EncodeError};
use crate::typed_data::TypedData;

/// A key able to produce one or more kinds of signature.
#[async_trait]
pub trait SigningAccount: Send + Sync + fmt::Debug {
    /// Human-readable identifier used in error messages (never key material).
    fn label(&self) -> String;

    /// Ethereum address of an ECDSA account.
    fn address(&self) -> Option<Address> {
        None
    }

    /// Public credential of a passkey account.
    fn credential(&self) -> Option<&PasskeyCredential> {
        None
    }

    /// EIP-191 signature over a 32-byte hash. Returns `r ‖ s ‖ v`.
    async fn sign_message(&self, hash: B256) -> Result<Bytes, CapabilityError> {
        let _ = hash;
        Err(self.missing(Capability::SignMessage))
    }

    /// EIP-712 signature over a typed-data document. Returns `r ‖ s ‖ v`.
    async fn sign_typed_data(&self, data: &TypedData) -> Result<Bytes, CapabilityError> {
        let _ = data;
        Err(self.missing(Capability::SignTypedData))
    }

    /// WebAuthn assertion with `challenge` as the client data challenge.
    async fn sign_webauthn(&self, challenge: B256) -> Result<WebAuthnAssertion, CapabilityError> {
        let _ = challenge;
        Err(self.missing(Capability::SignWebAuthn))
    }

    fn missing(&self, capability: Capability) -> CapabilityError {
        CapabilityError::Missing {
            capability,
            account: self.label(),
        }
    }
}

// ============================================================================
// LOCAL ECDSA ACCOUNT
// ============================================================================

/// secp256k1 key held in memory.
pub struct LocalEcdsaAccount {
    signing_key: SigningKey,
    address: Address,
}

impl fmt::Debug for LocalEcdsaAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEcdsaAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalEcdsaAccount {
    /// Creates an account from a 32-byte private key.
    ///
    /// # Arguments
    ///
    /// * `private_key` - Raw secp256k1 scalar
    ///
    /// # Returns
    ///
    /// * `Ok(LocalEcdsaAccount)` - Account with its derived Ethereum address
    /// * `Err(EncodeError)` - The scalar is zero or not below the curve order
    pub fn from_bytes(private_key: &B256) -> Result<Self, EncodeError> {
        let signing_key = SigningKey::from_slice(private_key.as_slice())
            .map_err(|e| EncodeError::InvalidInput(format!("invalid private key: {e}")))?;
        let address = ethereum_address(signing_key.verifying_key());
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Creates an account from a hex private key (with or without `0x`).
    pub fn from_hex(private_key: &str) -> Result<Self, EncodeError> {
        let raw = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|e| EncodeError::InvalidInput(format!("invalid private key hex: {e}")))?;
        if raw.len() != 32 {
            return Err(EncodeError::InvalidInput(format!(
                "private key must be 32 bytes, got {}",
                raw.len()
            )));
        }
        Self::from_bytes(&B256::from_slice(&raw))
    }

    pub fn eth_address(&self) -> Address {
        self.address
    }

    /// Signs a precomputed digest and returns `r ‖ s ‖ v` with `v ∈ {27, 28}`.
    pub fn sign_hash(&self, digest: &B256) -> Result<Bytes, CapabilityError> {
        let signature: Signature = self
            .signing_key
            .sign_prehash(digest.as_slice())
            .map_err(|e| self.failed(Capability::SignMessage, e))?;

        let recovery_id = self.recovery_id(digest, &signature);

        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&signature.to_bytes());
        out.push(recovery_id + 27);
        Ok(out.into())
    }

    // Recovery id is whichever of 0/1 recovers our own key.
    fn recovery_id(&self, digest: &B256, signature: &Signature) -> u8 {
        let own_key = self.signing_key.verifying_key();
        let matches = |id: u8| {
            RecoveryId::try_from(id)
                .ok()
                .and_then(|rid| {
                    VerifyingKey::recover_from_prehash(digest.as_slice(), signature, rid).ok()
                })
                .map_or(false, |recovered| &recovered == own_key)
        };
        if matches(0) {
            0
        } else {
            1
        }
    }

    fn failed(&self, capability: Capability, err: impl fmt::Display) -> CapabilityError {
        CapabilityError::Failed {
            capability,
            account: self.label(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl SigningAccount for LocalEcdsaAccount {
    fn label(&self) -> String {
        format!("local:{}", self.address)
    }

    fn address(&self) -> Option<Address> {
        Some(self.address)
    }

    async fn sign_message(&self, hash: B256) -> Result<Bytes, CapabilityError> {
        self.sign_hash(&personal_message_hash(hash.as_slice()))
    }

    async fn sign_typed_data(&self, data: &TypedData) -> Result<Bytes, CapabilityError> {
        let digest = data
            .signing_hash()
            .map_err(|e| self.failed(Capability::SignTypedData, e))?;
        self.sign_hash(&digest)
    }
}

/// `keccak256("\x19Ethereum Signed Message:\n" ‖ len ‖ message)`.
pub fn personal_message_hash(message: &[u8]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    B256::from_slice(&hasher.finalize())
}

/// `keccak256(uncompressed_public_key[1..])[12..]`.
pub fn ethereum_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

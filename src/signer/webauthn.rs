//! WebAuthn / passkey signature encoding.

use alloy_primitives::{uint, Bytes, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

/// Order of the P-256 curve.
const P256_N: U256 =
    uint!(0xFFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551_U256);

/// Chains exposing the RIP-7212 P-256 verification precompile.
pub const RIP7212_CHAINS: &[u64] = &[
    10,       // Optimism
    137,      // Polygon
    8453,     // Base
    42161,    // Arbitrum One
    80002,    // Polygon Amoy
    84532,    // Base Sepolia
    421614,   // Arbitrum Sepolia
    11155420, // Optimism Sepolia
];

/// Public half of a passkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyCredential {
    /// Credential id as reported by the authenticator.
    pub id: String,
    pub pub_key_x: U256,
    pub pub_key_y: U256,
    #[serde(default)]
    pub require_user_verification: bool,
}

/// Authenticator response for a single assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAuthnAssertion {
    pub authenticator_data: Bytes,
    pub client_data_json: String,
    /// Offset of `"type":"webauthn.get"` inside `client_data_json`.
    pub response_type_location: U256,
    pub r: U256,
    pub s: U256,
}

pub fn uses_precompile(chain_id: u64) -> bool {
    RIP7212_CHAINS.contains(&chain_id)
}

/// Maps `s` into the lower half of the curve order.
pub fn normalize_s(s: U256) -> U256 {
    if s > P256_N >> 1 {
        P256_N - s
    } else {
        s
    }
}

/// ABI-encodes an assertion as
/// `(bytes authenticatorData, string clientDataJSON, uint256 responseTypeLocation, uint256 r, uint256 s, bool usePrecompile)`.
pub fn encode_assertion(assertion: &WebAuthnAssertion, chain_id: u64) -> Bytes {
    (
        assertion.authenticator_data.clone(),
        assertion.client_data_json.clone(),
        assertion.response_type_location,
        assertion.r,
        normalize_s(assertion.s),
        uses_precompile(chain_id),
    )
        .abi_encode_params()
        .into()
}

/// Several passkey signatures are carried as `abi.encode(bytes[])`; a single
/// one is passed through unchanged.
pub fn pack_assertions(mut encoded: Vec<Bytes>) -> Bytes {
    if encoded.len() == 1 {
        return encoded.remove(0);
    }
    (encoded,).abi_encode_params().into()
}

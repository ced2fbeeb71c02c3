//! Intent Codec
//!
//! Cross-chain intents and the EIP-712 commitments their sponsor signs.
//!
//! - [`compact`]: `MultichainCompact` resource-lock commitments (the default)
//! - [`permit2`]: Permit2 batch-witness transfers for single-origin intents
//! - [`single_chain`]: same-chain operations run by the intent executor

pub mod compact;
pub mod permit2;
pub mod single_chain;

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use futures::future::{try_join, try_join_all};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::chain::Call;
use crate::error::{ConfigError, Error};
use crate::settlement::orchestrator::SignedIntentOp;
use crate::signer::{self, Payload, SignContext, SignPurpose, SignerSet};

pub use compact::{build_typed_data, hash, COMPACT_ADDRESS};

// ============================================================================
// INTENT TYPES
// ============================================================================

/// A signed-over bundle of cross-chain commitments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentOp {
    pub sponsor: Address,
    #[serde(with = "crate::wire::u256_dec")]
    pub nonce: U256,
    #[serde(with = "crate::wire::u256_dec")]
    pub expires: U256,
    /// `elements[0]` is the notarized chain.
    pub elements: Vec<IntentElement>,
}

impl IntentOp {
    /// The chain whose domain separator signs the whole intent.
    pub fn notarized_chain_id(&self) -> Result<u64, ConfigError> {
        self.elements
            .first()
            .map(|e| e.chain_id)
            .ok_or(ConfigError::EmptyIntent)
    }
}

/// Funds locked on one origin chain and what they pay for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentElement {
    pub arbiter: Address,
    pub chain_id: u64,
    /// `(tokenId, amount)`; the token id packs a 12-byte lock tag over the token address.
    #[serde(with = "crate::wire::u256_pairs")]
    pub ids_and_amounts: Vec<(U256, U256)>,
    pub mandate: IntentMandate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMandate {
    pub recipient: Address,
    /// `(tokenId, amount)` delivered on the destination chain.
    #[serde(with = "crate::wire::u256_pairs")]
    pub token_out: Vec<(U256, U256)>,
    pub destination_chain_id: u64,
    #[serde(with = "crate::wire::u256_dec")]
    pub fill_deadline: U256,
    #[serde(with = "crate::wire::u128_dec")]
    pub min_gas: u128,
    pub pre_claim_ops: OpBundle,
    pub destination_ops: OpBundle,
    /// Only `keccak256(qualifier)` is committed to.
    #[serde(default)]
    pub qualifier: Bytes,
}

impl IntentMandate {
    pub fn qualifier_hash(&self) -> B256 {
        keccak256(&self.qualifier)
    }
}

/// Calls with their execution mode word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpBundle {
    pub vt: B256,
    pub ops: Vec<Call>,
}

impl OpBundle {
    pub fn new(vt: B256, ops: Vec<Call>) -> Self {
        Self { vt, ops }
    }

    pub(crate) fn to_json(&self) -> Value {
        json!({
            "vt": self.vt,
            "ops": self
                .ops
                .iter()
                .map(|op| json!({
                    "to": op.to,
                    "value": op.value.to_string(),
                    "data": op.data,
                }))
                .collect::<Vec<_>>(),
        })
    }
}

// ============================================================================
// TOKEN IDS
// ============================================================================

/// Splits a resource-lock token id into `(lockTag, token)`: the high 96 bits
/// and the low 160 bits.
pub fn split_token_id(id: U256) -> (FixedBytes<12>, Address) {
    let bytes: [u8; 32] = id.to_be_bytes();
    (
        FixedBytes::from_slice(&bytes[..12]),
        Address::from_slice(&bytes[12..]),
    )
}

/// Inverse of [`split_token_id`].
pub fn combine_token_id(lock_tag: FixedBytes<12>, token: Address) -> U256 {
    let mut bytes = [0u8; 32];
    bytes[..12].copy_from_slice(lock_tag.as_slice());
    bytes[12..].copy_from_slice(token.as_slice());
    U256::from_be_bytes(bytes)
}

/// Token address of a packed id.
pub fn token_address(id: U256) -> Address {
    split_token_id(id).1
}

// ============================================================================
// SIGNING
// ============================================================================

/// Signs the compact commitment of `op` once per origin element and once for
/// the destination chain.
///
/// Every signature covers the same typed data; only the chain handed to the
/// signer differs, which matters for passkeys and sessions.
pub async fn sign_intent(
    op: &IntentOp,
    signers: &SignerSet,
    account: Address,
) -> Result<SignedIntentOp, Error> {
    let typed = build_typed_data(op)?;
    let payload = Payload::TypedData(typed);
    let context = SignContext::new(account, SignPurpose::Intent);

    let first = op.elements.first().ok_or(ConfigError::EmptyIntent)?;
    let destination_chain = first.mandate.destination_chain_id;

    let origins = try_join_all(
        op.elements
            .iter()
            .map(|element| signer::sign(signers, element.chain_id, &context, &payload)),
    );
    let destination = signer::sign(signers, destination_chain, &context, &payload);
    let (origin_signatures, destination_signature) = try_join(origins, destination).await?;
    debug!(
        "Signed intent for {} origin chain(s) and destination {}",
        origin_signatures.len(),
        destination_chain
    );

    Ok(SignedIntentOp {
        intent_op: op.clone(),
        origin_signatures,
        destination_signature,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use alloy_primitives::address;

    pub(crate) const USDC_ID: &str =
        "0x000000000000000000000001a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    pub(crate) fn intent_op() -> IntentOp {
        let usdc: U256 = USDC_ID.parse().unwrap();
        IntentOp {
            sponsor: address!("1111111111111111111111111111111111111111"),
            nonce: U256::from(42),
            expires: U256::from(1_900_000_000u64),
            elements: vec![IntentElement {
                arbiter: address!("2222222222222222222222222222222222222222"),
                chain_id: 8453,
                ids_and_amounts: vec![(usdc, U256::from(1_000_000u64))],
                mandate: IntentMandate {
                    recipient: address!("1111111111111111111111111111111111111111"),
                    token_out: vec![(usdc, U256::from(990_000u64))],
                    destination_chain_id: 10,
                    fill_deadline: U256::from(1_800_000_000u64),
                    min_gas: 250_000,
                    pre_claim_ops: OpBundle::default(),
                    destination_ops: OpBundle::new(
                        B256::ZERO,
                        vec![Call::new(
                            address!("3333333333333333333333333333333333333333"),
                            vec![0xde, 0xad, 0xbe, 0xef],
                        )
                        .with_value(U256::from(5))],
                    ),
                    qualifier: Bytes::from(vec![0x01, 0x02]),
                },
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{to_signer_set, LocalEcdsaAccount, OwnerSet, SigningAccount};
    use crate::signer::webauthn::{encode_assertion, WebAuthnAssertion};
    use alloy_primitives::fixed_bytes;
    use std::sync::Arc;

    #[test]
    fn test_split_then_combine_is_identity() {
        let id: U256 = fixtures::USDC_ID.parse().unwrap();
        let (tag, token) = split_token_id(id);
        assert_eq!(tag, fixed_bytes!("000000000000000000000001"));
        assert_eq!(
            token,
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".parse::<Address>().unwrap()
        );
        assert_eq!(combine_token_id(tag, token), id);
    }

    #[test]
    fn test_split_covers_full_width() {
        let id = U256::MAX;
        let (tag, token) = split_token_id(id);
        assert_eq!(tag, FixedBytes::<12>::repeat_byte(0xff));
        assert_eq!(token, Address::repeat_byte(0xff));
        assert_eq!(combine_token_id(tag, token), id);
    }

    #[test]
    fn test_intent_json_uses_decimal_strings() {
        let json = serde_json::to_value(fixtures::intent_op()).unwrap();
        assert_eq!(json["nonce"], "42");
        assert_eq!(json["elements"][0]["chainId"], 8453);
        assert_eq!(json["elements"][0]["mandate"]["minGas"], "250000");
        assert_eq!(json["elements"][0]["idsAndAmounts"][0][1], "1000000");
        let back: IntentOp = serde_json::from_value(json).unwrap();
        assert_eq!(back, fixtures::intent_op());
    }

    #[test]
    fn test_empty_intent_has_no_notarized_chain() {
        let op = IntentOp {
            elements: Vec::new(),
            ..fixtures::intent_op()
        };
        assert_eq!(op.notarized_chain_id(), Err(ConfigError::EmptyIntent));
    }

    #[tokio::test]
    async fn test_sign_intent_signs_each_chain() {
        let key = Arc::new(
            LocalEcdsaAccount::from_hex(
                "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
            )
            .unwrap(),
        );
        let op = fixtures::intent_op();
        let signers = to_signer_set(&OwnerSet::ecdsa(vec![key.clone()]));

        let signed = sign_intent(&op, &signers, op.sponsor).await.unwrap();

        let expected = key
            .sign_typed_data(&build_typed_data(&op).unwrap())
            .await
            .unwrap();
        assert_eq!(signed.origin_signatures, vec![expected.clone()]);
        assert_eq!(signed.destination_signature, expected);
    }

    /// Passkey that always returns the same assertion.
    #[derive(Debug)]
    struct FixedPasskey;

    #[async_trait::async_trait]
    impl crate::signer::SigningAccount for FixedPasskey {
        fn label(&self) -> String {
            "fixed-passkey".to_string()
        }

        async fn sign_webauthn(
            &self,
            _challenge: B256,
        ) -> Result<WebAuthnAssertion, crate::error::CapabilityError> {
            Ok(assertion())
        }
    }

    fn assertion() -> WebAuthnAssertion {
        WebAuthnAssertion {
            authenticator_data: Bytes::from(vec![0xaa; 37]),
            client_data_json: r#"{"type":"webauthn.get"}"#.to_string(),
            response_type_location: U256::from(1),
            r: U256::from(11),
            s: U256::from(22),
        }
    }

    #[tokio::test]
    async fn test_sign_intent_keeps_element_order() {
        let mut op = fixtures::intent_op();
        let mut mainnet = op.elements[0].clone();
        mainnet.chain_id = 1;
        op.elements.push(mainnet);
        let signers = to_signer_set(&OwnerSet::passkey(vec![Arc::new(FixedPasskey)]));

        let signed = sign_intent(&op, &signers, op.sponsor).await.unwrap();

        assert_eq!(
            signed.origin_signatures,
            vec![encode_assertion(&assertion(), 8453), encode_assertion(&assertion(), 1)]
        );
        assert_ne!(signed.origin_signatures[0], signed.origin_signatures[1]);
        assert_eq!(signed.destination_signature, encode_assertion(&assertion(), 10));
    }
}

//! Signature aggregation over a [`SignerSet`].

use alloy_primitives::{Address, Bytes, FixedBytes, B256};
use alloy_sol_types::{sol, SolValue};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::debug;

use super::owners::AccountRef;
use super::webauthn::{encode_assertion, pack_assertions};
use super::{MultiFactorSigner, OwnerSigners, SignerSet, MAX_NESTING_DEPTH};
use crate::error::{ConfigError, Error};
use crate::session;
use crate::typed_data::{TypedData, TypedDataDomain};

sol! {
    /// One multi-factor signature slot.
    struct SignatureEntry {
        bytes32 packedValidatorAndId;
        bytes data;
    }
}

/// What is being signed.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A 32-byte digest (user operation hash, message hash).
    Hash(B256),
    /// A full EIP-712 document.
    TypedData(TypedData),
}

impl Payload {
    /// Digest a passkey or session envelope commits to.
    pub fn digest(&self) -> Result<B256, Error> {
        match self {
            Payload::Hash(hash) => Ok(*hash),
            Payload::TypedData(data) => Ok(data.signing_hash()?),
        }
    }
}

/// Why a signature is requested. Decides whether session signatures are
/// wrapped in an ERC-7739 envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignPurpose {
    /// ERC-4337 user operation validation.
    UserOperation,
    /// ERC-1271 message or typed-data validation.
    Message,
    /// Cross-chain intent authorisation.
    Intent,
}

#[derive(Debug, Clone)]
pub struct SignContext {
    /// The smart account the signature is for.
    pub account: Address,
    pub purpose: SignPurpose,
    /// The account's own EIP-712 domain, needed for ERC-7739 envelopes.
    pub account_domain: Option<TypedDataDomain>,
}

impl SignContext {
    pub fn new(account: Address, purpose: SignPurpose) -> Self {
        Self {
            account,
            purpose,
            account_domain: None,
        }
    }

    pub fn with_account_domain(mut self, domain: TypedDataDomain) -> Self {
        self.account_domain = Some(domain);
        self
    }
}

/// Produces the aggregated signature of `signers` over `payload`.
///
/// The signer tree is validated before any signing callback runs. Every
/// sub-signer is asked concurrently; output order follows declaration order.
///
/// # Arguments
///
/// * `signers` - Normalised signer set
/// * `chain_id` - Chain the signature will be verified on
/// * `context` - Account and purpose of the signature
/// * `payload` - Hash or typed data to sign
///
/// # Returns
///
/// * `Ok(Bytes)` - Packed signature for the validator
/// * `Err(Error)` - Configuration, capability or encoding failure
pub async fn sign(
    signers: &SignerSet,
    chain_id: u64,
    context: &SignContext,
    payload: &Payload,
) -> Result<Bytes, Error> {
    if signers.depth() > MAX_NESTING_DEPTH {
        return Err(ConfigError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        }
        .into());
    }
    sign_nested(signers, chain_id, context, payload).await
}

pub(crate) fn sign_nested<'a>(
    signers: &'a SignerSet,
    chain_id: u64,
    context: &'a SignContext,
    payload: &'a Payload,
) -> BoxFuture<'a, Result<Bytes, Error>> {
    async move {
        match signers {
            SignerSet::Owner(OwnerSigners::Ecdsa { accounts })
            | SignerSet::Guardians { accounts } => {
                if accounts.is_empty() {
                    return Err(ConfigError::MissingOwners.into());
                }
                sign_ecdsa(accounts, payload).await
            }
            SignerSet::Owner(OwnerSigners::Passkey { accounts }) => {
                if accounts.is_empty() {
                    return Err(ConfigError::MissingOwners.into());
                }
                sign_passkeys(accounts, chain_id, payload).await
            }
            SignerSet::Owner(OwnerSigners::MultiFactor { validators }) => {
                sign_multi_factor(validators, chain_id, context, payload).await
            }
            SignerSet::Session {
                session,
                enable_data,
            } => {
                session::signature::sign_with_session(
                    session,
                    enable_data.as_deref(),
                    chain_id,
                    context,
                    payload,
                )
                .await
            }
        }
    }
    .boxed()
}

async fn sign_ecdsa(accounts: &[AccountRef], payload: &Payload) -> Result<Bytes, Error> {
    let signatures = try_join_all(accounts.iter().map(|account| async move {
        match payload {
            Payload::Hash(hash) => account.sign_message(*hash).await,
            Payload::TypedData(data) => account.sign_typed_data(data).await,
        }
    }))
    .await?;

    debug!("Collected {} ECDSA signature(s)", signatures.len());
    Ok(concat(&signatures))
}

async fn sign_passkeys(
    accounts: &[AccountRef],
    chain_id: u64,
    payload: &Payload,
) -> Result<Bytes, Error> {
    let challenge = payload.digest()?;
    let assertions = try_join_all(
        accounts
            .iter()
            .map(|account| account.sign_webauthn(challenge)),
    )
    .await?;

    let encoded = assertions
        .iter()
        .map(|assertion| encode_assertion(assertion, chain_id))
        .collect();
    Ok(pack_assertions(encoded))
}

async fn sign_multi_factor(
    validators: &[Option<MultiFactorSigner>],
    chain_id: u64,
    context: &SignContext,
    payload: &Payload,
) -> Result<Bytes, Error> {
    let signatures = try_join_all(validators.iter().map(|slot| async move {
        match slot {
            Some(slot) => sign_nested(&slot.signers, chain_id, context, payload).await,
            None => Ok(Bytes::new()),
        }
    }))
    .await?;

    let entries: Vec<SignatureEntry> = validators
        .iter()
        .zip(signatures)
        .enumerate()
        .map(|(position, (slot, data))| {
            let (id, validator) = slot
                .as_ref()
                .map_or((position as u64, Address::ZERO), |s| (s.id, s.validator));
            SignatureEntry {
                packedValidatorAndId: pack_validator_and_id(id, validator),
                data,
            }
        })
        .collect();

    Ok((entries,).abi_encode_params().into())
}

pub(crate) fn concat(parts: &[Bytes]) -> Bytes {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out.into()
}

/// 12-byte big-endian id followed by the 20-byte validator address.
pub fn pack_validator_and_id(id: u64, validator: Address) -> FixedBytes<32> {
    let mut packed = [0u8; 32];
    packed[4..12].copy_from_slice(&id.to_be_bytes());
    packed[12..].copy_from_slice(validator.as_slice());
    FixedBytes::from(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{to_signer_set, LocalEcdsaAccount, OwnerSet};
    use alloy_primitives::{address, keccak256};
    use alloy_sol_types::SolType;
    use std::sync::Arc;

    fn key(n: u8) -> AccountRef {
        let mut raw = [0u8; 32];
        raw[31] = n;
        Arc::new(LocalEcdsaAccount::from_bytes(&raw.into()).unwrap())
    }

    fn context() -> SignContext {
        SignContext::new(Address::ZERO, SignPurpose::UserOperation)
    }

    #[test]
    fn test_pack_validator_and_id_layout() {
        let validator = address!("f6bdf42c9be18ceca5c06c42a43daf7fbbe7896b");
        let packed = pack_validator_and_id(0x0102, validator);
        assert_eq!(&packed[..10], &[0u8; 10]);
        assert_eq!(&packed[10..12], &[0x01, 0x02]);
        assert_eq!(&packed[12..], validator.as_slice());
    }

    #[tokio::test]
    async fn test_ecdsa_signatures_concatenate_in_listed_order() {
        let hash = keccak256(b"order");
        let (a, b) = (key(1), key(2));
        let signers = to_signer_set(&OwnerSet::ecdsa(vec![a.clone(), b.clone()]));

        let combined = sign(&signers, 1, &context(), &Payload::Hash(hash))
            .await
            .unwrap();
        let first = a.sign_message(hash).await.unwrap();
        let second = b.sign_message(hash).await.unwrap();

        assert_eq!(combined.len(), 130);
        assert_eq!(&combined[..65], &first[..]);
        assert_eq!(&combined[65..], &second[..]);
    }

    #[tokio::test]
    async fn test_multi_factor_null_slots_contribute_empty_data() {
        let hash = keccak256(b"multi");
        let owners = OwnerSet::multi_factor(
            vec![Some(OwnerSet::ecdsa(vec![key(1)])), None, Some(OwnerSet::ecdsa(vec![key(2)]))],
            2,
        );
        let signature = sign(&to_signer_set(&owners), 1, &context(), &Payload::Hash(hash))
            .await
            .unwrap();

        let decoded =
            <(alloy_sol_types::sol_data::Array<SignatureEntry>,)>::abi_decode_params(&signature, true)
                .unwrap()
                .0;
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].data.len(), 65);
        assert!(decoded[1].data.is_empty());
        assert_eq!(decoded[1].packedValidatorAndId, pack_validator_and_id(1, Address::ZERO));
        assert_eq!(decoded[2].data.len(), 65);
        let total: usize = decoded.iter().map(|e| e.data.len()).sum();
        assert_eq!(total, 130);
    }

    #[tokio::test]
    async fn test_too_deep_tree_is_rejected_before_signing() {
        let mut owners = OwnerSet::ecdsa(vec![key(1)]);
        for _ in 0..MAX_NESTING_DEPTH {
            owners = OwnerSet::multi_factor(vec![Some(owners)], 1);
        }
        let err = sign(
            &to_signer_set(&owners),
            1,
            &context(),
            &Payload::Hash(B256::ZERO),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::NestingTooDeep { max: MAX_NESTING_DEPTH })
        ));
    }

    #[tokio::test]
    async fn test_session_over_deepest_owner_tree_signs() {
        let mut owners = OwnerSet::ecdsa(vec![key(1)]);
        for _ in 1..MAX_NESTING_DEPTH {
            owners = OwnerSet::multi_factor(vec![Some(owners)], 1);
        }
        assert_eq!(owners.depth(), MAX_NESTING_DEPTH);
        let session = crate::session::Session::new(owners);
        assert!(crate::session::permission_id(&session).is_ok());

        let signature = sign(
            &SignerSet::session(session),
            1,
            &context(),
            &Payload::Hash(B256::ZERO),
        )
        .await
        .unwrap();
        assert_eq!(signature[0], 0x00);
    }

    #[tokio::test]
    async fn test_passkey_without_webauthn_capability_fails() {
        let signers = to_signer_set(&OwnerSet::passkey(vec![key(3)]));
        let err = sign(&signers, 1, &context(), &Payload::Hash(B256::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Capability(_)));
    }
}

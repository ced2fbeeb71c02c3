//! `MultichainCompact` commitments.
//!
//! Two independent hashers produce the same digest: the JSON document handed
//! to external signers, and the statically-typed `sol!` structs used for
//! [`hash`].

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{sol, SolStruct};
use serde_json::json;

use super::{split_token_id, token_address, IntentElement, IntentOp, OpBundle};
use crate::error::{EncodeError, Error};
use crate::typed_data::{types_from, TypeMap, TypedData, TypedDataDomain};

pub const COMPACT_ADDRESS: Address = address!("73d2dc0c21fca4ec1601895d50df7f5624f07d3f");
pub const COMPACT_DOMAIN_NAME: &str = "The Compact";
pub const COMPACT_DOMAIN_VERSION: &str = "1";

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct MultichainCompact {
        address sponsor;
        uint256 nonce;
        uint256 expires;
        Element[] elements;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Element {
        address arbiter;
        uint256 chainId;
        Lock[] commitments;
        Mandate mandate;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Lock {
        bytes12 lockTag;
        address token;
        uint256 amount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Mandate {
        Target target;
        uint128 minGas;
        Op originOps;
        Op destOps;
        bytes32 q;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Target {
        address recipient;
        Token[] tokenOut;
        uint256 targetChain;
        uint256 fillExpiry;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Token {
        address token;
        uint256 amount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Op {
        bytes32 vt;
        Ops[] ops;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Ops {
        address to;
        uint256 value;
        bytes data;
    }
}

/// EIP-712 types of the compact, shared with the Permit2 witness.
pub(crate) fn mandate_types() -> Vec<(&'static str, &'static [(&'static str, &'static str)])> {
    vec![
        (
            "Mandate",
            &[
                ("target", "Target"),
                ("minGas", "uint128"),
                ("originOps", "Op"),
                ("destOps", "Op"),
                ("q", "bytes32"),
            ][..],
        ),
        (
            "Target",
            &[
                ("recipient", "address"),
                ("tokenOut", "Token[]"),
                ("targetChain", "uint256"),
                ("fillExpiry", "uint256"),
            ][..],
        ),
        ("Token", &[("token", "address"), ("amount", "uint256")][..]),
        ("Op", &[("vt", "bytes32"), ("ops", "Ops[]")][..]),
        (
            "Ops",
            &[("to", "address"), ("value", "uint256"), ("data", "bytes")][..],
        ),
    ]
}

fn compact_types() -> TypeMap {
    let mut defs = vec![
        (
            "MultichainCompact",
            &[
                ("sponsor", "address"),
                ("nonce", "uint256"),
                ("expires", "uint256"),
                ("elements", "Element[]"),
            ][..],
        ),
        (
            "Element",
            &[
                ("arbiter", "address"),
                ("chainId", "uint256"),
                ("commitments", "Lock[]"),
                ("mandate", "Mandate"),
            ][..],
        ),
        (
            "Lock",
            &[("lockTag", "bytes12"), ("token", "address"), ("amount", "uint256")][..],
        ),
    ];
    defs.extend(mandate_types());
    types_from(&defs)
}

/// Domain of the notarized chain.
pub fn domain(chain_id: u64) -> TypedDataDomain {
    TypedDataDomain {
        name: Some(COMPACT_DOMAIN_NAME.to_string()),
        version: Some(COMPACT_DOMAIN_VERSION.to_string()),
        chain_id: Some(chain_id),
        verifying_contract: Some(COMPACT_ADDRESS),
        salt: None,
    }
}

pub(crate) fn mandate_json(element: &IntentElement) -> serde_json::Value {
    let mandate = &element.mandate;
    json!({
        "target": {
            "recipient": mandate.recipient,
            "tokenOut": mandate
                .token_out
                .iter()
                .map(|(id, amount)| json!({
                    "token": token_address(*id),
                    "amount": amount.to_string(),
                }))
                .collect::<Vec<_>>(),
            "targetChain": mandate.destination_chain_id.to_string(),
            "fillExpiry": mandate.fill_deadline.to_string(),
        },
        "minGas": mandate.min_gas.to_string(),
        "originOps": mandate.pre_claim_ops.to_json(),
        "destOps": mandate.destination_ops.to_json(),
        "q": mandate.qualifier_hash(),
    })
}

/// EIP-712 document for `op`, ready for any external signer.
///
/// # Returns
///
/// * `Ok(TypedData)` - `MultichainCompact` under the notarized chain's domain
/// * `Err(Error::Config)` - `op` has no elements
pub fn build_typed_data(op: &IntentOp) -> Result<TypedData, Error> {
    let chain_id = op.notarized_chain_id()?;

    let elements = op
        .elements
        .iter()
        .map(|element| {
            json!({
                "arbiter": element.arbiter,
                "chainId": element.chain_id.to_string(),
                "commitments": element
                    .ids_and_amounts
                    .iter()
                    .map(|(id, amount)| {
                        let (lock_tag, token) = split_token_id(*id);
                        json!({
                            "lockTag": lock_tag,
                            "token": token,
                            "amount": amount.to_string(),
                        })
                    })
                    .collect::<Vec<_>>(),
                "mandate": mandate_json(element),
            })
        })
        .collect::<Vec<_>>();

    Ok(TypedData::new(
        domain(chain_id),
        compact_types(),
        "MultichainCompact",
        json!({
            "sponsor": op.sponsor,
            "nonce": op.nonce.to_string(),
            "expires": op.expires.to_string(),
            "elements": elements,
        }),
    ))
}

pub(crate) fn op_sol(bundle: &OpBundle) -> Op {
    Op {
        vt: bundle.vt,
        ops: bundle
            .ops
            .iter()
            .map(|call| Ops {
                to: call.to,
                value: call.value,
                data: Bytes::clone(&call.data),
            })
            .collect(),
    }
}

pub(crate) fn mandate_sol(element: &IntentElement) -> Mandate {
    let mandate = &element.mandate;
    Mandate {
        target: Target {
            recipient: mandate.recipient,
            tokenOut: mandate
                .token_out
                .iter()
                .map(|(id, amount)| Token {
                    token: token_address(*id),
                    amount: *amount,
                })
                .collect(),
            targetChain: U256::from(mandate.destination_chain_id),
            fillExpiry: mandate.fill_deadline,
        },
        minGas: mandate.min_gas,
        originOps: op_sol(&mandate.pre_claim_ops),
        destOps: op_sol(&mandate.destination_ops),
        q: mandate.qualifier_hash(),
    }
}

/// Statically-typed form of `op`.
pub fn to_sol(op: &IntentOp) -> Result<MultichainCompact, Error> {
    if op.elements.is_empty() {
        return Err(crate::error::ConfigError::EmptyIntent.into());
    }
    Ok(MultichainCompact {
        sponsor: op.sponsor,
        nonce: op.nonce,
        expires: op.expires,
        elements: op
            .elements
            .iter()
            .map(|element| Element {
                arbiter: element.arbiter,
                chainId: U256::from(element.chain_id),
                commitments: element
                    .ids_and_amounts
                    .iter()
                    .map(|(id, amount)| {
                        let (lock_tag, token) = split_token_id(*id);
                        Lock {
                            lockTag: lock_tag,
                            token,
                            amount: *amount,
                        }
                    })
                    .collect(),
                mandate: mandate_sol(element),
            })
            .collect(),
    })
}

/// EIP-712 signing hash of `op`.
pub fn hash(op: &IntentOp) -> Result<alloy_primitives::B256, Error> {
    let chain_id = op.notarized_chain_id()?;
    let compact = to_sol(op)?;
    Ok(compact.eip712_signing_hash(&domain(chain_id).to_alloy()))
}

/// Fails when the two hashers disagree for `op`.
pub fn verify_agreement(op: &IntentOp) -> Result<(), Error> {
    let dynamic = build_typed_data(op)?.signing_hash()?;
    let fixed = hash(op)?;
    if dynamic != fixed {
        return Err(EncodeError::TypedData(format!(
            "typed-data hash {dynamic} differs from struct hash {fixed}"
        ))
        .into());
    }
    Ok(())
}

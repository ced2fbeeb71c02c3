//! Permit2 batch-witness transfers.
//!
//! A single-origin intent funded by Permit2 allowances instead of resource
//! locks. The element's mandate rides along as the witness.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::SolStruct;
use serde_json::json;

use super::compact::{mandate_json, mandate_types};
use super::{token_address, IntentElement, OpBundle};
use crate::error::Error;
use crate::typed_data::{types_from, TypeMap, TypedData, TypedDataDomain};

pub const PERMIT2_ADDRESS: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");
pub const PERMIT2_DOMAIN_NAME: &str = "Permit2";

mod eip712 {
    alloy_sol_types::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct PermitBatchWitnessTransferFrom {
            TokenPermissions[] permitted;
            address spender;
            uint256 nonce;
            uint256 deadline;
            Mandate mandate;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct TokenPermissions {
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
}

pub use eip712::PermitBatchWitnessTransferFrom;

fn permit2_types() -> TypeMap {
    let mut defs = vec![
        (
            "PermitBatchWitnessTransferFrom",
            &[
                ("permitted", "TokenPermissions[]"),
                ("spender", "address"),
                ("nonce", "uint256"),
                ("deadline", "uint256"),
                ("mandate", "Mandate"),
            ][..],
        ),
        (
            "TokenPermissions",
            &[("token", "address"), ("amount", "uint256")][..],
        ),
    ];
    defs.extend(mandate_types());
    types_from(&defs)
}

/// Permit2 domain; Permit2 has no version.
pub fn domain(chain_id: u64) -> TypedDataDomain {
    TypedDataDomain {
        name: Some(PERMIT2_DOMAIN_NAME.to_string()),
        version: None,
        chain_id: Some(chain_id),
        verifying_contract: Some(PERMIT2_ADDRESS),
        salt: None,
    }
}

/// EIP-712 document for a Permit2-funded element. The arbiter is the spender.
pub fn build_typed_data(
    element: &IntentElement,
    nonce: U256,
    expires: U256,
) -> Result<TypedData, Error> {
    let permitted = element
        .ids_and_amounts
        .iter()
        .map(|(id, amount)| {
            json!({
                "token": token_address(*id),
                "amount": amount.to_string(),
            })
        })
        .collect::<Vec<_>>();

    Ok(TypedData::new(
        domain(element.chain_id),
        permit2_types(),
        "PermitBatchWitnessTransferFrom",
        json!({
            "permitted": permitted,
            "spender": element.arbiter,
            "nonce": nonce.to_string(),
            "deadline": expires.to_string(),
            "mandate": mandate_json(element),
        }),
    ))
}

fn op_sol(bundle: &OpBundle) -> eip712::Op {
    eip712::Op {
        vt: bundle.vt,
        ops: bundle
            .ops
            .iter()
            .map(|call| eip712::Ops {
                to: call.to,
                value: call.value,
                data: call.data.clone(),
            })
            .collect(),
    }
}

/// Statically-typed form of the permit.
pub fn to_sol(element: &IntentElement, nonce: U256, expires: U256) -> PermitBatchWitnessTransferFrom {
    let mandate = &element.mandate;
    PermitBatchWitnessTransferFrom {
        permitted: element
            .ids_and_amounts
            .iter()
            .map(|(id, amount)| eip712::TokenPermissions {
                token: token_address(*id),
                amount: *amount,
            })
            .collect(),
        spender: element.arbiter,
        nonce,
        deadline: expires,
        mandate: eip712::Mandate {
            target: eip712::Target {
                recipient: mandate.recipient,
                tokenOut: mandate
                    .token_out
                    .iter()
                    .map(|(id, amount)| eip712::Token {
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
        },
    }
}

/// EIP-712 signing hash of the permit.
pub fn hash(element: &IntentElement, nonce: U256, expires: U256) -> alloy_primitives::B256 {
    to_sol(element, nonce, expires).eip712_signing_hash(&domain(element.chain_id).to_alloy())
}

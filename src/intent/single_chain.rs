//! Same-chain operations authorised for the intent executor.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::OpBundle;
use crate::error::Error;
use crate::module::executor::INTENT_EXECUTOR_ADDRESS;
use crate::typed_data::{types_from, TypeMap, TypedData, TypedDataDomain};

pub const EXECUTOR_DOMAIN_NAME: &str = "IntentExecutor";
pub const EXECUTOR_DOMAIN_VERSION: &str = "v0.0.1";

/// Repays the relayer in `token` at `exchange_rate`, plus a fixed `overhead`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasRefund {
    pub token: Address,
    #[serde(with = "crate::wire::u256_dec")]
    pub exchange_rate: U256,
    #[serde(with = "crate::wire::u256_dec")]
    pub overhead: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleChainOps {
    pub account: Address,
    /// Executor contract; the default deployment when `None`.
    #[serde(default)]
    pub intent_executor: Option<Address>,
    pub chain_id: u64,
    pub ops: OpBundle,
    #[serde(with = "crate::wire::u256_dec")]
    pub nonce: U256,
    /// Without a refund the legacy `GasRefund(token, exchangeRate)` shape is
    /// signed with zero values.
    #[serde(default)]
    pub gas_refund: Option<GasRefund>,
}

fn types(with_overhead: bool) -> TypeMap {
    let gas_refund: &[(&str, &str)] = if with_overhead {
        &[
            ("token", "address"),
            ("exchangeRate", "uint256"),
            ("overhead", "uint256"),
        ]
    } else {
        &[("token", "address"), ("exchangeRate", "uint256")]
    };
    types_from(&[
        (
            "SingleChainOps",
            &[
                ("account", "address"),
                ("nonce", "uint256"),
                ("op", "Op"),
                ("gasRefund", "GasRefund"),
            ],
        ),
        ("GasRefund", gas_refund),
        ("Op", &[("vt", "bytes32"), ("ops", "Ops[]")]),
        (
            "Ops",
            &[("to", "address"), ("value", "uint256"), ("data", "bytes")],
        ),
    ])
}

impl SingleChainOps {
    pub fn executor(&self) -> Address {
        self.intent_executor.unwrap_or(INTENT_EXECUTOR_ADDRESS)
    }

    pub fn domain(&self) -> TypedDataDomain {
        TypedDataDomain {
            name: Some(EXECUTOR_DOMAIN_NAME.to_string()),
            version: Some(EXECUTOR_DOMAIN_VERSION.to_string()),
            chain_id: Some(self.chain_id),
            verifying_contract: Some(self.executor()),
            salt: None,
        }
    }

    /// EIP-712 document the account signs.
    pub fn build_typed_data(&self) -> Result<TypedData, Error> {
        let gas_refund = match &self.gas_refund {
            Some(refund) => json!({
                "token": refund.token,
                "exchangeRate": refund.exchange_rate.to_string(),
                "overhead": refund.overhead.to_string(),
            }),
            None => json!({
                "token": Address::ZERO,
                "exchangeRate": "0",
            }),
        };

        Ok(TypedData::new(
            self.domain(),
            types(self.gas_refund.is_some()),
            "SingleChainOps",
            json!({
                "account": self.account,
                "nonce": self.nonce.to_string(),
                "op": self.ops.to_json(),
                "gasRefund": gas_refund,
            }),
        ))
    }
}

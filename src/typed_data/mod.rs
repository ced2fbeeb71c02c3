//! EIP-712 Typed Data
//!
//! A generic, JSON-driven typed-data document and hasher. Intents, session
//! enablement and ERC-7739 envelopes are all produced as [`TypedData`]
//! documents so that any external signer (wallet, hardware key, remote
//! service) can sign exactly what the on-chain verifier recomputes.

mod cache;
mod encoder;

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EncodeError;

pub use encoder::{encode_type, hash_struct, type_hash};
pub(crate) use encoder::parse_uint;

/// Name of the domain type, which is never hashed as part of the message types.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// A single `{ name, type }` member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Struct name -> ordered member list.
pub type TypeMap = BTreeMap<String, Vec<TypedDataField>>;

/// Builds a [`TypeMap`] from `(struct, [(name, type)])` literals.
pub fn types_from(defs: &[(&str, &[(&str, &str)])]) -> TypeMap {
    defs.iter()
        .map(|(name, fields)| {
            let fields = fields
                .iter()
                .map(|(field, ty)| TypedDataField::new(*field, *ty))
                .collect();
            (name.to_string(), fields)
        })
        .collect()
}

/// The EIP-712 domain. Absent fields are omitted from both the JSON document
/// and the `EIP712Domain` type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<B256>,
}

impl TypedDataDomain {
    /// Domain separator (`hashStruct(EIP712Domain)`).
    pub fn separator(&self) -> B256 {
        self.to_alloy().separator()
    }

    /// The equivalent statically-typed domain used by `sol!` structs.
    pub fn to_alloy(&self) -> alloy_sol_types::Eip712Domain {
        alloy_sol_types::Eip712Domain::new(
            self.name.clone().map(Into::into),
            self.version.clone().map(Into::into),
            self.chain_id.map(U256::from),
            self.verifying_contract,
            self.salt,
        )
    }
}

/// A complete EIP-712 typed-data document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub domain: TypedDataDomain,
    pub types: TypeMap,
    pub primary_type: String,
    pub message: Value,
}

impl TypedData {
    pub fn new(
        domain: TypedDataDomain,
        types: TypeMap,
        primary_type: impl Into<String>,
        message: Value,
    ) -> Self {
        Self {
            domain,
            types,
            primary_type: primary_type.into(),
            message,
        }
    }

    /// Encoded type string of the primary type.
    pub fn encode_type(&self) -> Result<String, EncodeError> {
        encode_type(&self.types, &self.primary_type)
    }

    /// `hashStruct(message)` for the primary type.
    pub fn struct_hash(&self) -> Result<B256, EncodeError> {
        hash_struct(&self.types, &self.primary_type, &self.message)
    }

    /// `keccak256(0x1901 ‖ domainSeparator ‖ hashStruct(message))`.
    pub fn signing_hash(&self) -> Result<B256, EncodeError> {
        Ok(signing_hash(self.domain.separator(), self.struct_hash()?))
    }
}

/// Final EIP-712 digest from a domain separator and a struct hash.
pub fn signing_hash(domain_separator: B256, struct_hash: B256) -> B256 {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain_separator.as_slice());
    buf[34..66].copy_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_sol_types::{sol, SolStruct};
    use serde_json::json;

    sol! {
        struct Person {
            string name;
            address wallet;
        }

        struct Mail {
            Person from;
            Person to;
            string contents;
        }
    }

    fn mail_types() -> TypeMap {
        types_from(&[
            ("Person", &[("name", "string"), ("wallet", "address")]),
            (
                "Mail",
                &[("from", "Person"), ("to", "Person"), ("contents", "string")],
            ),
        ])
    }

    fn mail_domain() -> TypedDataDomain {
        TypedDataDomain {
            name: Some("Ether Mail".into()),
            version: Some("1".into()),
            chain_id: Some(1),
            verifying_contract: Some(address!("CcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC")),
            salt: None,
        }
    }

    #[test]
    fn test_mail_encode_type_lists_dependencies() {
        let encoded = encode_type(&mail_types(), "Mail").unwrap();
        assert_eq!(
            encoded,
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn test_mail_signing_hash_matches_reference_vector() {
        let data = TypedData::new(
            mail_domain(),
            mail_types(),
            "Mail",
            json!({
                "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
                "to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
                "contents": "Hello, Bob!"
            }),
        );

        assert_eq!(
            data.domain.separator().to_string(),
            "0xf2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
        assert_eq!(
            data.signing_hash().unwrap().to_string(),
            "0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2"
        );
    }

    #[test]
    fn test_generic_engine_agrees_with_sol_struct() {
        let mail = Mail {
            from: Person {
                name: "Cow".into(),
                wallet: address!("CD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"),
            },
            to: Person {
                name: "Bob".into(),
                wallet: address!("bBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"),
            },
            contents: "Hello, Bob!".into(),
        };
        let data = TypedData::new(
            mail_domain(),
            mail_types(),
            "Mail",
            json!({
                "from": { "name": "Cow", "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826" },
                "to": { "name": "Bob", "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB" },
                "contents": "Hello, Bob!"
            }),
        );

        assert_eq!(
            data.signing_hash().unwrap(),
            mail.eip712_signing_hash(&mail_domain().to_alloy())
        );
    }

    #[test]
    fn test_document_serializes_with_camel_case_keys() {
        let data = TypedData::new(mail_domain(), mail_types(), "Mail", json!({}));
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["primaryType"], "Mail");
        assert_eq!(value["domain"]["chainId"], 1);
        assert!(value["domain"].get("salt").is_none());
        assert_eq!(value["types"]["Person"][1]["type"], "address");
    }
}

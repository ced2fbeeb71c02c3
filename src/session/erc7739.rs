//! ERC-7739 nested typed-data envelopes.
//!
//! An ERC-1271 signature made through a session commits to both the
//! application's payload and the verifying account's own EIP-712 domain, so a
//! signature for one account can never be replayed against another.
//!
//! - Typed data is wrapped in `TypedDataSign(Contents contents,string name,string version,uint256 chainId,address verifyingContract,bytes32 salt)`
//!   under the application's domain, and the signature carries
//!   `appDomainSeparator ‖ contentsHash ‖ contentsType ‖ uint16(contentsType.length)`.
//! - Raw message hashes are wrapped in `PersonalSign(bytes prefixed)` under the
//!   account's domain; the signature carries no suffix.

use alloy_primitives::{keccak256, Bytes, B256};
use serde_json::json;

use crate::error::EncodeError;
use crate::typed_data::{self, TypedData, TypedDataDomain, TypedDataField};

pub const PERSONAL_SIGN_TYPE: &str = "PersonalSign(bytes prefixed)";
pub const TYPED_DATA_SIGN: &str = "TypedDataSign";

/// A wrapped typed-data payload ready to sign.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDataSignEnvelope {
    /// The `TypedDataSign` document itself.
    pub typed_data: TypedData,
    /// Its EIP-712 signing hash.
    pub hash: B256,
    /// Bytes appended after the inner signature.
    pub suffix: Bytes,
}

impl TypedDataSignEnvelope {
    /// `innerSignature ‖ suffix`.
    pub fn wrap(&self, inner: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(inner.len() + self.suffix.len());
        out.extend_from_slice(inner);
        out.extend_from_slice(&self.suffix);
        out.into()
    }
}

/// Wraps an application's typed data in a `TypedDataSign` envelope for the
/// account described by `account_domain`.
///
/// # Arguments
///
/// * `account_domain` - EIP-712 domain of the verifying smart account
/// * `contents` - The application's typed data
///
/// # Returns
///
/// * `Ok(TypedDataSignEnvelope)` - Envelope document, hash and signature suffix
/// * `Err(EncodeError)` - The contents cannot be hashed
pub fn typed_data_sign(
    account_domain: &TypedDataDomain,
    contents: &TypedData,
) -> Result<TypedDataSignEnvelope, EncodeError> {
    let contents_name = contents.primary_type.clone();
    if contents_name == TYPED_DATA_SIGN {
        return Err(EncodeError::TypedData(
            "contents are already a TypedDataSign envelope".into(),
        ));
    }
    let contents_type = contents.encode_type()?;
    let contents_hash = contents.struct_hash()?;
    let app_separator = contents.domain.separator();

    let mut types = contents.types.clone();
    types.remove(typed_data::DOMAIN_TYPE_NAME);
    types.insert(
        TYPED_DATA_SIGN.to_string(),
        vec![
            TypedDataField::new("contents", contents_name.as_str()),
            TypedDataField::new("name", "string"),
            TypedDataField::new("version", "string"),
            TypedDataField::new("chainId", "uint256"),
            TypedDataField::new("verifyingContract", "address"),
            TypedDataField::new("salt", "bytes32"),
        ],
    );

    let message = json!({
        "contents": contents.message.clone(),
        "name": account_domain.name.clone().unwrap_or_default(),
        "version": account_domain.version.clone().unwrap_or_default(),
        "chainId": account_domain.chain_id.unwrap_or_default().to_string(),
        "verifyingContract": account_domain.verifying_contract.unwrap_or_default(),
        "salt": account_domain.salt.unwrap_or_default(),
    });

    let typed_data = TypedData::new(contents.domain.clone(), types, TYPED_DATA_SIGN, message);
    let hash = typed_data.signing_hash()?;

    let length = u16::try_from(contents_type.len()).map_err(|_| {
        EncodeError::TypedData(format!(
            "contents type is {} bytes, longer than uint16",
            contents_type.len()
        ))
    })?;
    let mut suffix = Vec::with_capacity(64 + contents_type.len() + 2);
    suffix.extend_from_slice(app_separator.as_slice());
    suffix.extend_from_slice(contents_hash.as_slice());
    suffix.extend_from_slice(contents_type.as_bytes());
    suffix.extend_from_slice(&length.to_be_bytes());

    Ok(TypedDataSignEnvelope {
        typed_data,
        hash,
        suffix: suffix.into(),
    })
}

/// Hash of the `PersonalSign` envelope around an ERC-1271 message hash.
///
/// `prefixed` is hashed as `bytes`, so its struct member is the EIP-191
/// message hash the application already passes to `isValidSignature`.
pub fn personal_sign_hash(account_domain: &TypedDataDomain, message_hash: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(keccak256(PERSONAL_SIGN_TYPE.as_bytes()).as_slice());
    buf[32..].copy_from_slice(message_hash.as_slice());
    typed_data::signing_hash(account_domain.separator(), keccak256(buf))
}

/// `PersonalSign` document for a raw message, for signers that render typed data.
pub fn personal_sign_typed_data(account_domain: &TypedDataDomain, message: &[u8]) -> TypedData {
    let mut prefixed = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    prefixed.extend_from_slice(message);
    TypedData::new(
        account_domain.clone(),
        typed_data::types_from(&[("PersonalSign", &[("prefixed", "bytes")])]),
        "PersonalSign",
        json!({ "prefixed": format!("0x{}", hex::encode(prefixed)) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::account::personal_message_hash;
    use crate::typed_data::types_from;
    use alloy_primitives::{address, U256};

    fn account_domain() -> TypedDataDomain {
        TypedDataDomain {
            name: Some("Nexus".into()),
            version: Some("1.2.0".into()),
            chain_id: Some(8453),
            verifying_contract: Some(address!("1111111111111111111111111111111111111111")),
            salt: Some(B256::ZERO),
        }
    }

    fn contents() -> TypedData {
        TypedData::new(
            TypedDataDomain {
                name: Some("App".into()),
                version: Some("1".into()),
                chain_id: Some(8453),
                verifying_contract: Some(address!("2222222222222222222222222222222222222222")),
                salt: None,
            },
            types_from(&[("Mail", &[("contents", "string"), ("value", "uint256")])]),
            "Mail",
            json!({ "contents": "hello", "value": "7" }),
        )
    }

    #[test]
    fn test_typed_data_sign_suffix_layout() {
        let app = contents();
        let envelope = typed_data_sign(&account_domain(), &app).unwrap();
        let contents_type = "Mail(string contents,uint256 value)";

        assert_eq!(&envelope.suffix[..32], app.domain.separator().as_slice());
        assert_eq!(&envelope.suffix[32..64], app.struct_hash().unwrap().as_slice());
        assert_eq!(&envelope.suffix[64..64 + contents_type.len()], contents_type.as_bytes());
        assert_eq!(
            &envelope.suffix[envelope.suffix.len() - 2..],
            &(contents_type.len() as u16).to_be_bytes()
        );
    }

    #[test]
    fn test_typed_data_sign_hash_matches_manual_construction() {
        let app = contents();
        let domain = account_domain();
        let envelope = typed_data_sign(&domain, &app).unwrap();

        let type_hash = keccak256(
            "TypedDataSign(Mail contents,string name,string version,uint256 chainId,address verifyingContract,bytes32 salt)Mail(string contents,uint256 value)",
        );
        let mut buf = Vec::new();
        buf.extend_from_slice(type_hash.as_slice());
        buf.extend_from_slice(app.struct_hash().unwrap().as_slice());
        buf.extend_from_slice(keccak256("Nexus").as_slice());
        buf.extend_from_slice(keccak256("1.2.0").as_slice());
        buf.extend_from_slice(&U256::from(8453).to_be_bytes::<32>());
        buf.extend_from_slice(domain.verifying_contract.unwrap().into_word().as_slice());
        buf.extend_from_slice(B256::ZERO.as_slice());
        let expected = typed_data::signing_hash(app.domain.separator(), keccak256(buf));

        assert_eq!(envelope.hash, expected);
    }

    #[test]
    fn test_wrap_appends_suffix() {
        let envelope = typed_data_sign(&account_domain(), &contents()).unwrap();
        let wrapped = envelope.wrap(&[0xaa; 65]);
        assert_eq!(wrapped.len(), 65 + envelope.suffix.len());
        assert_eq!(&wrapped[..65], &[0xaa; 65]);
    }

    #[test]
    fn test_personal_sign_hash_agrees_with_document() {
        let domain = account_domain();
        let message = b"hello world";
        let document = personal_sign_typed_data(&domain, message);

        assert_eq!(
            personal_sign_hash(&domain, personal_message_hash(message)),
            document.signing_hash().unwrap()
        );
    }

    #[test]
    fn test_nested_envelope_is_rejected() {
        let envelope = typed_data_sign(&account_domain(), &contents()).unwrap();
        assert!(typed_data_sign(&account_domain(), &envelope.typed_data).is_err());
    }
}

//! Session signature encodings.
//!
//! ```text
//! USE    : 0x00 ‖ permissionId ‖ innerSignature
//! ENABLE : 0x01 ‖ permissionId ‖ abi.encode(EnableSession, bytes innerSignature)
//! ```

use alloy_primitives::{Bytes, B256};
use alloy_sol_types::SolValue;
use tracing::debug;

use super::permission::{self, abi};
use super::{erc7739, Session, SessionEnableData};
use crate::error::{ConfigError, Error};
use crate::signer::sign::{concat, sign_nested};
use crate::signer::{to_signer_set, Payload, SignContext, SignPurpose};

/// Leading byte of a session signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionMode {
    /// The session is already enabled.
    Use = 0x00,
    /// Enable the session and use it in the same operation.
    Enable = 0x01,
}

impl SessionMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(SessionMode::Use),
            0x01 => Some(SessionMode::Enable),
            _ => None,
        }
    }
}

/// `0x00 ‖ permissionId ‖ signature`.
pub fn encode_use(permission_id: B256, signature: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(33 + signature.len());
    out.push(SessionMode::Use as u8);
    out.extend_from_slice(permission_id.as_slice());
    out.extend_from_slice(signature);
    out.into()
}

/// `0x01 ‖ permissionId ‖ abi.encode(EnableSession, bytes signature)`.
pub fn encode_enable(
    permission_id: B256,
    enable: abi::EnableSession,
    signature: &[u8],
) -> Bytes {
    let body = (enable, Bytes::copy_from_slice(signature)).abi_encode_params();
    let mut out = Vec::with_capacity(33 + body.len());
    out.push(SessionMode::Enable as u8);
    out.extend_from_slice(permission_id.as_slice());
    out.extend_from_slice(&body);
    out.into()
}

/// Signs `payload` with the session's owners and wraps the result in the
/// session signature format.
///
/// Message signatures are first wrapped in an ERC-7739 envelope under the
/// account's domain; user operation and intent signatures sign the payload
/// digest directly.
pub async fn sign_with_session(
    session: &Session,
    enable: Option<&SessionEnableData>,
    chain_id: u64,
    context: &SignContext,
    payload: &Payload,
) -> Result<Bytes, Error> {
    let permission_id = permission::permission_id(session)?;

    let (digest, suffix) = match (context.purpose, payload) {
        (SignPurpose::Message, payload) => {
            let domain = context.account_domain.as_ref().ok_or_else(|| {
                ConfigError::Invalid(
                    "signing a message with a session requires the account's EIP-712 domain"
                        .into(),
                )
            })?;
            match payload {
                Payload::TypedData(contents) => {
                    let envelope = erc7739::typed_data_sign(domain, contents)?;
                    (envelope.hash, envelope.suffix)
                }
                Payload::Hash(hash) => (erc7739::personal_sign_hash(domain, *hash), Bytes::new()),
            }
        }
        (_, payload) => (payload.digest()?, Bytes::new()),
    };

    let owners = to_signer_set(&session.owners);
    let inner = sign_nested(&owners, chain_id, context, &Payload::Hash(digest)).await?;
    let inner = concat(&[inner, suffix]);

    debug!(
        "Signed with session {} in {:?} mode",
        permission_id,
        if enable.is_some() {
            SessionMode::Enable
        } else {
            SessionMode::Use
        }
    );

    match enable {
        None => Ok(encode_use(permission_id, &inner)),
        Some(enable) => Ok(encode_enable(
            permission_id,
            permission::enable_session_sol(session, enable)?,
            &inner,
        )),
    }
}

//! WebAuthn validator: threshold over several passkey credentials.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::{sol, SolValue};

use super::{check_threshold, Module};
use crate::error::EncodeError;
use crate::signer::PasskeyCredential;

pub const WEBAUTHN_VALIDATOR_ADDRESS: Address =
    address!("0000000000578c4cb0e472a5462da43c495c3f33");

sol! {
    struct Credential {
        uint256 pubKeyX;
        uint256 pubKeyY;
        bool requireUV;
    }
}

/// Public P-256 key of a credential as the validator stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnCredential {
    pub pub_key_x: U256,
    pub pub_key_y: U256,
    pub require_user_verification: bool,
}

impl From<&PasskeyCredential> for WebAuthnCredential {
    fn from(credential: &PasskeyCredential) -> Self {
        Self {
            pub_key_x: credential.pub_key_x,
            pub_key_y: credential.pub_key_y,
            require_user_verification: credential.require_user_verification,
        }
    }
}

/// `abi.encode(uint256 threshold, (uint256 pubKeyX, uint256 pubKeyY, bool requireUV)[])`.
pub fn encode(
    threshold: u64,
    credentials: &[WebAuthnCredential],
    address: Option<Address>,
) -> Result<Module, EncodeError> {
    check_threshold(threshold, credentials.len(), "credentials")?;
    for (i, credential) in credentials.iter().enumerate() {
        let repeated = credentials[..i].iter().any(|earlier| {
            earlier.pub_key_x == credential.pub_key_x && earlier.pub_key_y == credential.pub_key_y
        });
        if repeated {
            return Err(EncodeError::InvalidInput(format!(
                "credential {:#x} is listed twice",
                credential.pub_key_x
            )));
        }
    }

    let entries: Vec<Credential> = credentials
        .iter()
        .map(|c| Credential {
            pubKeyX: c.pub_key_x,
            pubKeyY: c.pub_key_y,
            requireUV: c.require_user_verification,
        })
        .collect();

    let init_data = (U256::from(threshold), entries).abi_encode_params();
    Ok(Module::validator(
        address.unwrap_or(WEBAUTHN_VALIDATOR_ADDRESS),
        init_data,
    ))
}

//! Single-credential passkey validator.

use alloy_primitives::{address, keccak256, Address};
use alloy_sol_types::SolValue;

use super::webauthn::WebAuthnCredential;
use super::Module;

pub const PASSKEY_VALIDATOR_ADDRESS: Address =
    address!("2f167e55d42584f65e2e30a748f41ee75a311414");

/// `abi.encode((uint256 pubKeyX, uint256 pubKeyY), bytes32 keccak256(credentialId))`.
pub fn encode(
    credential: &WebAuthnCredential,
    credential_id: &str,
    address: Option<Address>,
) -> Module {
    let init_data = (
        (credential.pub_key_x, credential.pub_key_y),
        keccak256(credential_id.as_bytes()),
    )
        .abi_encode_params();
    Module::validator(address.unwrap_or(PASSKEY_VALIDATOR_ADDRESS), init_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_layout_is_three_static_words() {
        let credential = WebAuthnCredential {
            pub_key_x: U256::from(0xaa),
            pub_key_y: U256::from(0xbb),
            require_user_verification: true,
        };
        let module = encode(&credential, "credential-1", None);

        assert_eq!(module.init_data.len(), 96);
        assert_eq!(U256::from_be_slice(&module.init_data[..32]), U256::from(0xaa));
        assert_eq!(U256::from_be_slice(&module.init_data[32..64]), U256::from(0xbb));
        assert_eq!(&module.init_data[64..], keccak256(b"credential-1").as_slice());
    }
}

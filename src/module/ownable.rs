//! Ownable (threshold ECDSA) validator and the social recovery module, which
//! share the `abi.encode(uint256 threshold, address[] owners)` layout.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::SolValue;

use super::{check_threshold, Module};
use crate::error::EncodeError;

pub const OWNABLE_VALIDATOR_ADDRESS: Address = address!("000000000013fdb5234e4e3162a810f54d9f7e98");
pub const SOCIAL_RECOVERY_ADDRESS: Address = address!("a04d053b3c8021e8d5bf641816c42daa75d8b597");

/// `abi.encode(uint256 threshold, address[] owners)` with owners sorted ascending.
pub fn encode(
    threshold: u64,
    owners: &[Address],
    address: Option<Address>,
) -> Result<Module, EncodeError> {
    let init_data = threshold_and_sorted(threshold, owners, "owners")?;
    Ok(Module::validator(
        address.unwrap_or(OWNABLE_VALIDATOR_ADDRESS),
        init_data,
    ))
}

/// Social recovery validator over a guardian set.
pub fn social_recovery(threshold: u64, guardians: &[Address]) -> Result<Module, EncodeError> {
    let init_data = threshold_and_sorted(threshold, guardians, "guardians")?;
    Ok(Module::validator(SOCIAL_RECOVERY_ADDRESS, init_data))
}

fn threshold_and_sorted(
    threshold: u64,
    owners: &[Address],
    what: &str,
) -> Result<Vec<u8>, EncodeError> {
    check_threshold(threshold, owners.len(), what)?;

    // Byte order of an address equals the order of its lower-case hex form.
    let mut sorted = owners.to_vec();
    sorted.sort();
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(EncodeError::DuplicateOwner(pair[0]));
    }

    Ok((U256::from(threshold), sorted).abi_encode_params())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_A: Address = address!("f6c02c78ded62973b43bfa523b247da099486936");
    const ACCOUNT_B: Address = address!("6092086a3dc0020cd604a68fcf5d430007d51bb7");
    const ACCOUNT_C: Address = address!("c27b7578151c5ef713c62c65db09763d57ac3596");

    #[test]
    fn test_single_owner_golden() {
        let module = encode(1, &[ACCOUNT_A], None).unwrap();
        assert_eq!(module.address, OWNABLE_VALIDATOR_ADDRESS);
        assert!(module.de_init_data.is_empty());
        assert_eq!(
            module.init_data.to_string(),
            "0x000000000000000000000000000000000000000000000000000000000000000100000000000000000000000000000000000000000000000000000000000000400000000000000000000000000000000000000000000000000000000000000001000000000000000000000000f6c02c78ded62973b43bfa523b247da099486936"
        );
    }

    #[test]
    fn test_two_owners_are_sorted() {
        let module = encode(1, &[ACCOUNT_A, ACCOUNT_B], None).unwrap();
        assert_eq!(
            module.init_data.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001000000000000000000000000000000000000000000000000000000000000004000000000000000000000000000000000000000000000000000000000000000020000000000000000000000006092086a3dc0020cd604a68fcf5d430007d51bb7000000000000000000000000f6c02c78ded62973b43bfa523b247da099486936"
        );
    }

    #[test]
    fn test_three_owners_threshold_two() {
        let module = encode(2, &[ACCOUNT_A, ACCOUNT_B, ACCOUNT_C], None).unwrap();
        assert_eq!(
            module.init_data.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000002000000000000000000000000000000000000000000000000000000000000004000000000000000000000000000000000000000000000000000000000000000030000000000000000000000006092086a3dc0020cd604a68fcf5d430007d51bb7000000000000000000000000c27b7578151c5ef713c62c65db09763d57ac3596000000000000000000000000f6c02c78ded62973b43bfa523b247da099486936"
        );
    }

    #[test]
    fn test_encoding_is_permutation_invariant() {
        let permutations = [
            [ACCOUNT_A, ACCOUNT_B, ACCOUNT_C],
            [ACCOUNT_A, ACCOUNT_C, ACCOUNT_B],
            [ACCOUNT_B, ACCOUNT_A, ACCOUNT_C],
            [ACCOUNT_B, ACCOUNT_C, ACCOUNT_A],
            [ACCOUNT_C, ACCOUNT_A, ACCOUNT_B],
            [ACCOUNT_C, ACCOUNT_B, ACCOUNT_A],
        ];
        let expected = encode(2, &permutations[0], None).unwrap();
        for owners in &permutations[1..] {
            assert_eq!(encode(2, owners, None).unwrap(), expected);
        }
    }

    #[test]
    fn test_duplicate_owner_is_rejected() {
        let err = encode(1, &[ACCOUNT_A, ACCOUNT_B, ACCOUNT_A], None).unwrap_err();
        assert_eq!(err, EncodeError::DuplicateOwner(ACCOUNT_A));
    }

    #[test]
    fn test_custom_address_is_kept() {
        let module = encode(1, &[ACCOUNT_A], Some(ACCOUNT_C)).unwrap();
        assert_eq!(module.address, ACCOUNT_C);
    }

    #[test]
    fn test_social_recovery_uses_same_layout() {
        let recovery = social_recovery(1, &[ACCOUNT_B, ACCOUNT_A]).unwrap();
        let ownable = encode(1, &[ACCOUNT_A, ACCOUNT_B], None).unwrap();
        assert_eq!(recovery.address, SOCIAL_RECOVERY_ADDRESS);
        assert_eq!(recovery.init_data, ownable.init_data);
    }
}

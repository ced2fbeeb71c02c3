//! ENS validator: ECDSA owners that each carry an expiry.

use alloy_primitives::{address, aliases::U48, Address, U256};
use alloy_sol_types::{sol, SolValue};

use super::{check_threshold, Module};
use crate::error::EncodeError;

pub const ENS_VALIDATOR_ADDRESS: Address = address!("dc38f07b060374b6480c4bf06231e7d10955bca4");

/// Expiry used for owners configured without one.
pub const NO_EXPIRATION: u64 = (1 << 48) - 1;

sol! {
    struct ExpiringOwner {
        address addr;
        uint48 expiration;
    }
}

/// `abi.encode(uint256 threshold, (address addr, uint48 expiration)[])`, sorted by address.
pub fn encode(
    threshold: u64,
    owners: &[(Address, Option<u64>)],
    address: Option<Address>,
) -> Result<Module, EncodeError> {
    check_threshold(threshold, owners.len(), "owners")?;

    let mut pairs = owners
        .iter()
        .map(|(owner, expiration)| {
            let expiration = expiration.unwrap_or(NO_EXPIRATION);
            if expiration > NO_EXPIRATION {
                return Err(EncodeError::InvalidInput(format!(
                    "expiration {expiration} of {owner} does not fit uint48"
                )));
            }
            Ok((*owner, expiration))
        })
        .collect::<Result<Vec<_>, _>>()?;
    pairs.sort_by_key(|(owner, _)| *owner);
    if let Some(pair) = pairs.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(EncodeError::DuplicateOwner(pair[0].0));
    }

    let entries: Vec<ExpiringOwner> = pairs
        .into_iter()
        .map(|(addr, expiration)| ExpiringOwner {
            addr,
            expiration: U48::from(expiration),
        })
        .collect();

    let init_data = (U256::from(threshold), entries).abi_encode_params();
    Ok(Module::validator(
        address.unwrap_or(ENS_VALIDATOR_ADDRESS),
        init_data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_A: Address = address!("f6c02c78ded62973b43bfa523b247da099486936");
    const ACCOUNT_B: Address = address!("6092086a3dc0020cd604a68fcf5d430007d51bb7");

    fn word(n: u64) -> String {
        format!("{n:064x}")
    }

    fn addr_word(a: Address) -> String {
        format!("{:0>64}", hex::encode(a))
    }

    #[test]
    fn test_pairs_sorted_with_default_expiry() {
        let module = encode(
            1,
            &[(ACCOUNT_A, Some(1_900_000_000)), (ACCOUNT_B, None)],
            None,
        )
        .unwrap();

        let expected = [
            word(1),
            word(0x40),
            word(2),
            addr_word(ACCOUNT_B),
            word(NO_EXPIRATION),
            addr_word(ACCOUNT_A),
            word(1_900_000_000),
        ]
        .concat();
        assert_eq!(module.address, ENS_VALIDATOR_ADDRESS);
        assert_eq!(hex::encode(&module.init_data), expected);
    }

    #[test]
    fn test_expiration_overflow_is_rejected() {
        let err = encode(1, &[(ACCOUNT_A, Some(NO_EXPIRATION + 1))], None).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidInput(_)));
    }

    #[test]
    fn test_duplicate_owner_is_rejected() {
        let err = encode(1, &[(ACCOUNT_A, None), (ACCOUNT_A, Some(5))], None).unwrap_err();
        assert_eq!(err, EncodeError::DuplicateOwner(ACCOUNT_A));
    }
}

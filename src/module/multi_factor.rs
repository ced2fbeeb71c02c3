//! Multi-factor validator: a threshold over nested validators.
//!
//! `initData = uint8 threshold ‖ abi.encode((bytes32 packedValidatorAndId, bytes data)[])`
//! where each `data` is the nested validator's own `initData`. Empty slots are
//! left out of the array but still consume their positional id.

use alloy_primitives::{address, Address};
use alloy_sol_types::{sol, SolValue};

use super::{check_threshold, encode_unchecked, Module, ValidatorConfig};
use crate::error::{EncodeError, Error};
use crate::signer::sign::pack_validator_and_id;

pub const MULTI_FACTOR_VALIDATOR_ADDRESS: Address =
    address!("f6bdf42c9be18ceca5c06c42a43daf7fbbe7896b");

sol! {
    struct ValidatorEntry {
        bytes32 packedValidatorAndId;
        bytes data;
    }
}

pub fn encode(
    threshold: u64,
    validators: &[Option<ValidatorConfig>],
    address: Option<Address>,
) -> Result<Module, Error> {
    let present = validators.iter().flatten().count();
    check_threshold(threshold, present, "validators")?;
    let threshold = u8::try_from(threshold).map_err(|_| {
        EncodeError::InvalidInput(format!("threshold {threshold} does not fit uint8"))
    })?;

    let mut entries = Vec::with_capacity(present);
    for (id, slot) in validators.iter().enumerate() {
        let Some(config) = slot else {
            continue;
        };
        let inner = encode_unchecked(config)?;
        entries.push(ValidatorEntry {
            packedValidatorAndId: pack_validator_and_id(id as u64, inner.address),
            data: inner.init_data,
        });
    }

    let encoded = (entries,).abi_encode_params();
    let mut init_data = Vec::with_capacity(1 + encoded.len());
    init_data.push(threshold);
    init_data.extend_from_slice(&encoded);

    Ok(Module::validator(
        address.unwrap_or(MULTI_FACTOR_VALIDATOR_ADDRESS),
        init_data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::module::{self, ownable};
    use alloy_sol_types::SolType;

    const ACCOUNT_A: Address = address!("f6c02c78ded62973b43bfa523b247da099486936");
    const ACCOUNT_B: Address = address!("6092086a3dc0020cd604a68fcf5d430007d51bb7");

    fn ownable_config(owners: Vec<Address>) -> ValidatorConfig {
        ValidatorConfig::Ownable {
            threshold: 1,
            owners,
            address: None,
        }
    }

    fn decode(init_data: &[u8]) -> (u8, Vec<ValidatorEntry>) {
        let entries =
            <(alloy_sol_types::sol_data::Array<ValidatorEntry>,)>::abi_decode_params(&init_data[1..], true)
                .unwrap()
                .0;
        (init_data[0], entries)
    }

    #[test]
    fn test_null_slots_are_skipped_but_keep_ids() {
        let module = encode(
            1,
            &[None, Some(ownable_config(vec![ACCOUNT_A])), Some(ownable_config(vec![ACCOUNT_B]))],
            None,
        )
        .unwrap();
        let (threshold, entries) = decode(&module.init_data);

        assert_eq!(module.address, MULTI_FACTOR_VALIDATOR_ADDRESS);
        assert_eq!(threshold, 1);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].packedValidatorAndId,
            pack_validator_and_id(1, ownable::OWNABLE_VALIDATOR_ADDRESS)
        );
        assert_eq!(
            entries[1].packedValidatorAndId,
            pack_validator_and_id(2, ownable::OWNABLE_VALIDATOR_ADDRESS)
        );
    }

    #[test]
    fn test_entry_data_is_nested_init_data() {
        let inner = ownable_config(vec![ACCOUNT_B, ACCOUNT_A]);
        let module = encode(1, &[Some(inner.clone())], None).unwrap();
        let (_, entries) = decode(&module.init_data);

        assert_eq!(entries[0].data, module::encode(&inner).unwrap().init_data);
    }

    #[test]
    fn test_threshold_counts_only_present_slots() {
        let err = encode(2, &[Some(ownable_config(vec![ACCOUNT_A])), None], None).unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(EncodeError::InvalidThreshold { threshold: 2, count: 1 })
        ));
    }

    #[test]
    fn test_nesting_beyond_limit_is_rejected() {
        let mut config = ownable_config(vec![ACCOUNT_A]);
        for _ in 0..crate::signer::MAX_NESTING_DEPTH {
            config = ValidatorConfig::MultiFactor {
                threshold: 1,
                validators: vec![Some(config)],
                address: None,
            };
        }
        let err = module::encode(&config).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NestingTooDeep { .. })));
    }
}

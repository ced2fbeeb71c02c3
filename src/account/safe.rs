//! Safe accounts with the ERC-7579 adapter, deployed by the proxy factory.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;

use super::{
    createProxyWithNonceCall, hash_concat, initSafe7579Call, module_inits, salt_nonce,
    AccountKind, AccountSetup, AccountVendor, DeployArgs,
};
use crate::error::Error;
use crate::signer::OwnerSet;

/// Placeholder owner when no ECDSA key owns the Safe directly.
pub const SENTINEL_OWNER: Address = Address::with_last_byte(1);

pub struct Safe;

impl Safe {
    /// Native Safe owners: the ECDSA keys, or the sentinel for passkey and
    /// multi-factor accounts, which validate through modules only.
    fn native_owners(owners: &OwnerSet) -> (Vec<Address>, U256) {
        match owners {
            OwnerSet::Ecdsa { accounts, .. } => {
                let addresses: Vec<Address> =
                    accounts.iter().filter_map(|a| a.address()).collect();
                if addresses.is_empty() {
                    return (vec![SENTINEL_OWNER], U256::from(1));
                }
                (addresses, U256::from(owners.threshold()))
            }
            _ => (vec![SENTINEL_OWNER], U256::from(1)),
        }
    }

    pub fn initializer(&self, setup: &AccountSetup) -> Result<Bytes, Error> {
        let (owners, threshold) = Self::native_owners(&setup.owners);
        let call = initSafe7579Call {
            owners,
            threshold,
            validators: module_inits(&setup.validators()?),
            executors: module_inits(&setup.executors()),
        };
        Ok(call.abi_encode().into())
    }
}

impl AccountVendor for Safe {
    fn kind(&self) -> AccountKind {
        AccountKind::Safe
    }

    fn deploy_salt(&self, setup: &AccountSetup) -> Result<B256, Error> {
        let initializer_hash = keccak256(self.initializer(setup)?);
        Ok(hash_concat(
            initializer_hash.as_slice(),
            &salt_nonce(setup.salt).to_be_bytes::<32>(),
        ))
    }

    fn deploy_args(&self, setup: &AccountSetup) -> Result<DeployArgs, Error> {
        let factory_data = createProxyWithNonceCall {
            singleton: setup.bootstrap,
            initializer: self.initializer(setup)?,
            saltNonce: salt_nonce(setup.salt),
        }
        .abi_encode();
        Ok(DeployArgs {
            factory: setup.factory,
            factory_data: factory_data.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::fixtures;
    use crate::signer::OwnerSet;

    #[test]
    fn test_ecdsa_owners_become_safe_owners() {
        let setup = fixtures::setup(AccountKind::Safe);
        let init = Safe.initializer(&setup).unwrap();
        let decoded = initSafe7579Call::abi_decode(&init, true).unwrap();
        assert_eq!(decoded.owners, vec![fixtures::owner().eth_address()]);
        assert_eq!(decoded.threshold, U256::from(1));
    }

    #[test]
    fn test_passkey_owned_safe_uses_sentinel() {
        let mut setup = fixtures::setup(AccountKind::Safe);
        setup.owners = OwnerSet::passkey(vec![fixtures::owner()]);
        let (owners, threshold) = Safe::native_owners(&setup.owners);
        assert_eq!(owners, vec![SENTINEL_OWNER]);
        assert_eq!(threshold, U256::from(1));
    }

    #[test]
    fn test_salt_commits_to_initializer() {
        let setup = fixtures::setup(AccountKind::Safe);
        let initializer = Safe.initializer(&setup).unwrap();
        let mut preimage = keccak256(&initializer).to_vec();
        preimage.extend_from_slice(&[0u8; 32]);
        assert_eq!(Safe.deploy_salt(&setup).unwrap(), keccak256(preimage));

        let args = Safe.deploy_args(&setup).unwrap();
        let decoded = createProxyWithNonceCall::abi_decode(&args.factory_data, true).unwrap();
        assert_eq!(decoded.singleton, setup.bootstrap);
        assert_eq!(decoded.initializer, initializer);
        assert_eq!(decoded.saltNonce, U256::ZERO);
    }
}

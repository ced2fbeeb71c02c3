//! Nexus accounts, deployed through a bootstrap delegate-call.

use alloy_primitives::{Bytes, B256};
use alloy_sol_types::{SolCall, SolValue};

use super::{
    createAccountCall, hash_concat, initNexusCall, module_inits, AccountKind, AccountSetup,
    AccountVendor, DeployArgs,
};
use crate::error::Error;

pub struct Nexus;

impl Nexus {
    /// `abi.encode(bootstrap, initNexus(...))`, the account's `initializeAccount` argument.
    pub fn init_data(&self, setup: &AccountSetup) -> Result<Bytes, Error> {
        let call = initNexusCall {
            validators: module_inits(&setup.validators()?),
            executors: module_inits(&setup.executors()),
        }
        .abi_encode();
        Ok((setup.bootstrap, Bytes::from(call)).abi_encode_params().into())
    }
}

impl AccountVendor for Nexus {
    fn kind(&self) -> AccountKind {
        AccountKind::Nexus
    }

    fn deploy_salt(&self, setup: &AccountSetup) -> Result<B256, Error> {
        Ok(hash_concat(&self.init_data(setup)?, setup.salt.as_slice()))
    }

    fn deploy_args(&self, setup: &AccountSetup) -> Result<DeployArgs, Error> {
        let factory_data = createAccountCall {
            initData: self.init_data(setup)?,
            salt: setup.salt,
        }
        .abi_encode();
        Ok(DeployArgs {
            factory: setup.factory,
            factory_data: factory_data.into(),
        })
    }
}

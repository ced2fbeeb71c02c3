//! Kernel v3 accounts.
//!
//! Kernel identifies validators by a 21-byte id (`type ‖ address`) and wraps
//! module install data with a hook address. `address(1)` means "no hook".

use alloy_primitives::{Address, Bytes, FixedBytes, B256};
use alloy_sol_types::{SolCall, SolValue};

use super::{
    createAccountCall, hash_concat, initializeCall, installModuleCall, AccountKind, AccountSetup,
    AccountVendor, DeployArgs,
};
use crate::error::{ConfigError, Error};
use crate::module::{Module, ModuleType};

/// Validation type byte for a plain validator module.
pub const VALIDATION_TYPE_VALIDATOR: u8 = 0x01;
/// Hook sentinel meaning the module has no hook.
pub const NO_HOOK: Address = Address::with_last_byte(1);

/// `0x01 ‖ validator`.
pub fn validation_id(validator: Address) -> FixedBytes<21> {
    let mut id = [0u8; 21];
    id[0] = VALIDATION_TYPE_VALIDATOR;
    id[1..].copy_from_slice(validator.as_slice());
    FixedBytes(id)
}

/// `hook ‖ abi.encode(moduleData, hookData, selectorData)` as Kernel expects.
fn hooked_init_data(module: &Module) -> Bytes {
    let mut out = NO_HOOK.to_vec();
    let inner = match module.module_type {
        ModuleType::Validator => (module.init_data.clone(), Bytes::new(), Bytes::new()).abi_encode_params(),
        _ => (module.init_data.clone(), Bytes::new()).abi_encode_params(),
    };
    out.extend_from_slice(&inner);
    out.into()
}

pub struct Kernel;

impl Kernel {
    /// `initialize(...)` calldata: the owner validator is the root, every
    /// other module is installed through `initConfig`.
    pub fn init_data(&self, setup: &AccountSetup) -> Result<Bytes, Error> {
        let validators = setup.validators()?;
        let (root, rest) = validators
            .split_first()
            .ok_or(ConfigError::MissingOwners)?;

        let init_config = rest
            .iter()
            .chain(setup.executors().iter())
            .map(|module| self.install_data(module))
            .collect();

        let call = initializeCall {
            rootValidator: validation_id(root.address),
            hook: Address::ZERO,
            validatorData: root.init_data.clone(),
            hookData: Bytes::new(),
            initConfig: init_config,
        };
        Ok(call.abi_encode().into())
    }
}

impl AccountVendor for Kernel {
    fn kind(&self) -> AccountKind {
        AccountKind::Kernel
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

    fn install_data(&self, module: &Module) -> Bytes {
        installModuleCall {
            moduleTypeId: module.type_id(),
            module: module.address,
            initData: hooked_init_data(module),
        }
        .abi_encode()
        .into()
    }

    fn packed_signature(&self, validator: Address, signature: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(21 + signature.len());
        out.extend_from_slice(validation_id(validator).as_slice());
        out.extend_from_slice(signature);
        out.into()
    }
}

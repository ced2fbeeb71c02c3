//! Account Vendors
//!
//! Smart account implementations differ in how they are deployed, how
//! modules are installed and how a validator is selected from a signature.
//! Everything vendor-specific sits behind [`AccountVendor`]; [`vendor_for`]
//! is the only place that picks an implementation.

pub mod kernel;
pub mod nexus;
pub mod safe;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AccountConfig;
use crate::error::{ConfigError, Error};
use crate::module::{self, executor, ownable, smart_sessions, Module};
use crate::signer::{self, OwnerSet, Payload, SignContext, SignerSet};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct ModuleInit {
        address module;
        bytes initData;
    }

    function installModule(uint256 moduleTypeId, address module, bytes initData) external payable;

    function createAccount(bytes initData, bytes32 salt) external payable returns (address);

    function initNexus(ModuleInit[] validators, ModuleInit[] executors) external;

    function initSafe7579(
        address[] owners,
        uint256 threshold,
        ModuleInit[] validators,
        ModuleInit[] executors
    ) external;

    function createProxyWithNonce(address singleton, bytes initializer, uint256 saltNonce)
        external
        returns (address proxy);

    function initialize(
        bytes21 rootValidator,
        address hook,
        bytes validatorData,
        bytes hookData,
        bytes[] initConfig
    ) external;
}

/// Supported account implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Nexus,
    Safe,
    Kernel,
}

/// Everything that determines an account's counterfactual address.
#[derive(Debug, Clone)]
pub struct AccountSetup {
    pub kind: AccountKind,
    pub owners: OwnerSet,
    /// Install the smart sessions validator at deployment.
    pub sessions_enabled: bool,
    pub salt: B256,
    pub factory: Address,
    /// Hash of the proxy creation code the factory deploys.
    pub init_code_hash: B256,
    /// Vendor bootstrap contract (Nexus bootstrap, Safe singleton).
    pub bootstrap: Address,
    /// Additional executors installed at deployment.
    pub extra_modules: Vec<Module>,
    /// Recovery guardians; installs the social recovery validator.
    pub guardians: Option<GuardianSet>,
}

/// Guardian addresses and how many of them must sign a recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSet {
    pub threshold: u64,
    pub guardians: Vec<Address>,
}

impl AccountSetup {
    pub fn from_config(config: &AccountConfig, owners: OwnerSet) -> Self {
        Self {
            kind: config.kind,
            owners,
            sessions_enabled: config.sessions_enabled,
            salt: B256::ZERO,
            factory: config.factory,
            init_code_hash: config.init_code_hash,
            bootstrap: config.bootstrap.unwrap_or(Address::ZERO),
            extra_modules: Vec::new(),
            guardians: None,
        }
    }

    pub fn with_salt(mut self, salt: B256) -> Self {
        self.salt = salt;
        self
    }

    pub fn with_guardians(mut self, threshold: u64, guardians: Vec<Address>) -> Self {
        self.guardians = Some(GuardianSet {
            threshold,
            guardians,
        });
        self
    }

    /// Owner validator first, then smart sessions when enabled, then social
    /// recovery when guardians are set.
    pub fn validators(&self) -> Result<Vec<Module>, Error> {
        let mut validators = vec![module::encode_owner_set(&self.owners)?];
        if self.sessions_enabled {
            validators.push(smart_sessions::module());
        }
        if let Some(set) = &self.guardians {
            validators.push(ownable::social_recovery(set.threshold, &set.guardians)?);
        }
        Ok(validators)
    }

    /// Intent executor first, then any extra modules.
    pub fn executors(&self) -> Vec<Module> {
        let mut executors = vec![executor::intent_executor(None)];
        executors.extend(self.extra_modules.iter().cloned());
        executors
    }
}

/// Factory call that deploys the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployArgs {
    pub factory: Address,
    pub factory_data: Bytes,
}

pub(crate) fn module_inits(modules: &[Module]) -> Vec<ModuleInit> {
    modules
        .iter()
        .map(|m| ModuleInit {
            module: m.address,
            initData: m.init_data.clone(),
        })
        .collect()
}

/// Vendor-specific account behaviour.
pub trait AccountVendor: Send + Sync {
    fn kind(&self) -> AccountKind;

    /// CREATE2 salt the factory derives from the setup.
    fn deploy_salt(&self, setup: &AccountSetup) -> Result<B256, Error>;

    fn deploy_args(&self, setup: &AccountSetup) -> Result<DeployArgs, Error>;

    /// Counterfactual address.
    fn address(&self, setup: &AccountSetup) -> Result<Address, Error> {
        Ok(setup
            .factory
            .create2(self.deploy_salt(setup)?, setup.init_code_hash))
    }

    /// `installModule` calldata for `module`.
    fn install_data(&self, module: &Module) -> Bytes {
        installModuleCall {
            moduleTypeId: module.type_id(),
            module: module.address,
            initData: module.init_data.clone(),
        }
        .abi_encode()
        .into()
    }

    /// Signature as the account routes it to `validator`.
    fn packed_signature(&self, validator: Address, signature: &[u8]) -> Bytes {
        let mut out = Vec::with_capacity(20 + signature.len());
        out.extend_from_slice(validator.as_slice());
        out.extend_from_slice(signature);
        out.into()
    }
}

/// The implementation for `kind`.
pub fn vendor_for(kind: AccountKind) -> &'static dyn AccountVendor {
    match kind {
        AccountKind::Nexus => &nexus::Nexus,
        AccountKind::Safe => &safe::Safe,
        AccountKind::Kernel => &kernel::Kernel,
    }
}

// ============================================================================
// SMART ACCOUNT
// ============================================================================

/// A configured account: vendor, owners and deployment parameters.
pub struct SmartAccount {
    setup: AccountSetup,
    vendor: &'static dyn AccountVendor,
}

impl SmartAccount {
    pub fn new(setup: AccountSetup) -> Self {
        let vendor = vendor_for(setup.kind);
        Self { setup, vendor }
    }

    pub fn setup(&self) -> &AccountSetup {
        &self.setup
    }

    pub fn kind(&self) -> AccountKind {
        self.vendor.kind()
    }

    pub fn address(&self) -> Result<Address, Error> {
        self.vendor.address(&self.setup)
    }

    pub fn deploy_args(&self) -> Result<DeployArgs, Error> {
        self.vendor.deploy_args(&self.setup)
    }

    pub fn install_data(&self, module: &Module) -> Bytes {
        self.vendor.install_data(module)
    }

    /// Validator a signer set's signature is routed to.
    ///
    /// Fails for a signer set whose validator this account does not install.
    pub fn validator_for(&self, signers: &SignerSet) -> Result<Address, ConfigError> {
        match signers {
            SignerSet::Owner(_) => Ok(module::validator_address(&self.setup.owners)),
            SignerSet::Session { .. } if self.setup.sessions_enabled => {
                Ok(smart_sessions::SMART_SESSIONS_ADDRESS)
            }
            SignerSet::Session { .. } => Err(ConfigError::SessionsNotEnabled),
            SignerSet::Guardians { .. } if self.setup.guardians.is_some() => {
                Ok(ownable::SOCIAL_RECOVERY_ADDRESS)
            }
            SignerSet::Guardians { .. } => Err(ConfigError::GuardiansNotInstalled),
        }
    }

    /// Signs `payload` and packs the result for this account.
    ///
    /// # Returns
    ///
    /// * `Ok(Bytes)` - Vendor-packed signature
    /// * `Err(Error::Config)` - Session or guardian signer on an account without
    ///   the matching validator
    /// * `Err(Error)` - Any signing failure
    pub async fn sign(
        &self,
        signers: &SignerSet,
        chain_id: u64,
        context: &SignContext,
        payload: &Payload,
    ) -> Result<Bytes, Error> {
        let validator = self.validator_for(signers)?;
        let signature = signer::sign(signers, chain_id, context, payload).await?;
        debug!("Packing signature for validator {}", validator);
        Ok(self.vendor.packed_signature(validator, &signature))
    }
}

/// `keccak256(a ‖ b)`.
pub(crate) fn hash_concat(a: &[u8], b: &[u8]) -> B256 {
    let mut buf = Vec::with_capacity(a.len() + b.len());
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    alloy_primitives::keccak256(buf)
}

pub(crate) fn salt_nonce(salt: B256) -> U256 {
    U256::from_be_bytes(salt.0)
}

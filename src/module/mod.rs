//! Module Codec
//!
//! Serialises validator configuration into the exact `initData` layout each
//! ERC-7579 module decodes at install time. Every encoder is pure: the same
//! configuration always yields the same bytes, and owner lists are normalised
//! (sorted) so presentation order never leaks into the output.

pub mod ens;
pub mod executor;
pub mod multi_factor;
pub mod ownable;
pub mod passkey;
pub mod smart_sessions;
pub mod webauthn;

use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EncodeError, Error};
use crate::signer::{OwnerSet, SigningAccount, MAX_NESTING_DEPTH};

pub use webauthn::WebAuthnCredential;

// ============================================================================
// MODULE VALUE OBJECT
// ============================================================================

/// ERC-7579 module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Validator,
    Executor,
    Fallback,
    Hook,
}

impl ModuleType {
    /// Numeric id used by `installModule`.
    pub fn type_id(self) -> u64 {
        match self {
            ModuleType::Validator => 1,
            ModuleType::Executor => 2,
            ModuleType::Fallback => 3,
            ModuleType::Hook => 4,
        }
    }

    pub fn from_type_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(ModuleType::Validator),
            2 => Some(ModuleType::Executor),
            3 => Some(ModuleType::Fallback),
            4 => Some(ModuleType::Hook),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleType::Validator => "validator",
            ModuleType::Executor => "executor",
            ModuleType::Fallback => "fallback",
            ModuleType::Hook => "hook",
        };
        f.write_str(name)
    }
}

/// An installable module with its packed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub address: Address,
    pub init_data: Bytes,
    pub de_init_data: Bytes,
    pub additional_context: Bytes,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
}

impl Module {
    pub fn validator(address: Address, init_data: impl Into<Bytes>) -> Self {
        Self::new(ModuleType::Validator, address, init_data.into())
    }

    pub fn executor(address: Address, init_data: impl Into<Bytes>) -> Self {
        Self::new(ModuleType::Executor, address, init_data.into())
    }

    fn new(module_type: ModuleType, address: Address, init_data: Bytes) -> Self {
        Self {
            address,
            init_data,
            de_init_data: Bytes::new(),
            additional_context: Bytes::new(),
            module_type,
        }
    }

    pub fn type_id(&self) -> U256 {
        U256::from(self.module_type.type_id())
    }
}

// ============================================================================
// VALIDATOR CONFIGURATION
// ============================================================================

/// Plain-data validator configuration, one variant per on-chain layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorConfig {
    Ownable {
        threshold: u64,
        owners: Vec<Address>,
        address: Option<Address>,
    },
    /// ECDSA owners with expirations; `None` never expires.
    Ens {
        threshold: u64,
        owners: Vec<(Address, Option<u64>)>,
        address: Option<Address>,
    },
    WebAuthn {
        threshold: u64,
        credentials: Vec<WebAuthnCredential>,
        address: Option<Address>,
    },
    /// Single-credential passkey validator.
    Passkey {
        credential: WebAuthnCredential,
        credential_id: String,
        address: Option<Address>,
    },
    MultiFactor {
        threshold: u64,
        validators: Vec<Option<ValidatorConfig>>,
        address: Option<Address>,
    },
}

impl ValidatorConfig {
    /// Extracts the public configuration from a caller's owner set.
    pub fn from_owner_set(owners: &OwnerSet) -> Result<Self, ConfigError> {
        Ok(match owners {
            OwnerSet::Ecdsa {
                accounts, module, ..
            } => ValidatorConfig::Ownable {
                threshold: owners.threshold(),
                owners: accounts
                    .iter()
                    .map(|a| ecdsa_address(a.as_ref()))
                    .collect::<Result<_, _>>()?,
                address: *module,
            },
            OwnerSet::Ens {
                accounts,
                expirations,
                module,
                ..
            } => ValidatorConfig::Ens {
                threshold: owners.threshold(),
                owners: accounts
                    .iter()
                    .enumerate()
                    .map(|(i, a)| {
                        Ok((ecdsa_address(a.as_ref())?, expirations.get(i).copied().flatten()))
                    })
                    .collect::<Result<_, ConfigError>>()?,
                address: *module,
            },
            OwnerSet::Passkey {
                accounts, module, ..
            } => ValidatorConfig::WebAuthn {
                threshold: owners.threshold(),
                credentials: accounts
                    .iter()
                    .map(|a| {
                        a.credential()
                            .map(WebAuthnCredential::from)
                            .ok_or_else(|| ConfigError::UnsupportedOwner {
                                label: a.label(),
                                role: "a passkey owner",
                            })
                    })
                    .collect::<Result<_, _>>()?,
                address: *module,
            },
            OwnerSet::MultiFactor {
                validators, module, ..
            } => ValidatorConfig::MultiFactor {
                threshold: owners.threshold(),
                validators: validators
                    .iter()
                    .map(|slot| slot.as_ref().map(Self::from_owner_set).transpose())
                    .collect::<Result<_, _>>()?,
                address: *module,
            },
        })
    }

    pub fn depth(&self) -> usize {
        match self {
            ValidatorConfig::MultiFactor { validators, .. } => {
                1 + validators
                    .iter()
                    .flatten()
                    .map(ValidatorConfig::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 1,
        }
    }
}

fn ecdsa_address(account: &dyn SigningAccount) -> Result<Address, ConfigError> {
    account.address().ok_or_else(|| ConfigError::UnsupportedOwner {
        label: account.label(),
        role: "an ECDSA owner",
    })
}

// ============================================================================
// ENCODING
// ============================================================================

/// Encodes a validator configuration into its module.
///
/// # Arguments
///
/// * `config` - Validator kind and parameters
///
/// # Returns
///
/// * `Ok(Module)` - Validator module with packed `initData`
/// * `Err(Error)` - Invalid threshold, duplicate owner or too deep nesting
pub fn encode(config: &ValidatorConfig) -> Result<Module, Error> {
    if config.depth() > MAX_NESTING_DEPTH {
        return Err(ConfigError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        }
        .into());
    }
    encode_unchecked(config)
}

pub(crate) fn encode_unchecked(config: &ValidatorConfig) -> Result<Module, Error> {
    let module = match config {
        ValidatorConfig::Ownable {
            threshold,
            owners,
            address,
        } => ownable::encode(*threshold, owners, *address)?,
        ValidatorConfig::Ens {
            threshold,
            owners,
            address,
        } => ens::encode(*threshold, owners, *address)?,
        ValidatorConfig::WebAuthn {
            threshold,
            credentials,
            address,
        } => webauthn::encode(*threshold, credentials, *address)?,
        ValidatorConfig::Passkey {
            credential,
            credential_id,
            address,
        } => passkey::encode(credential, credential_id, *address),
        ValidatorConfig::MultiFactor {
            threshold,
            validators,
            address,
        } => multi_factor::encode(*threshold, validators, *address)?,
    };
    Ok(module)
}

/// Validator module for an owner set.
pub fn encode_owner_set(owners: &OwnerSet) -> Result<Module, Error> {
    encode(&ValidatorConfig::from_owner_set(owners)?)
}

/// Address of the validator that verifies signatures of `owners`.
pub fn validator_address(owners: &OwnerSet) -> Address {
    match owners {
        OwnerSet::Ecdsa { module, .. } => module.unwrap_or(ownable::OWNABLE_VALIDATOR_ADDRESS),
        OwnerSet::Ens { module, .. } => module.unwrap_or(ens::ENS_VALIDATOR_ADDRESS),
        OwnerSet::Passkey { module, .. } => module.unwrap_or(webauthn::WEBAUTHN_VALIDATOR_ADDRESS),
        OwnerSet::MultiFactor { module, .. } => {
            module.unwrap_or(multi_factor::MULTI_FACTOR_VALIDATOR_ADDRESS)
        }
    }
}

/// Threshold must lie in `[1, count]` over a non-empty set.
pub(crate) fn check_threshold(threshold: u64, count: usize, what: &str) -> Result<(), EncodeError> {
    if count == 0 {
        return Err(EncodeError::InvalidInput(format!("{what} must not be empty")));
    }
    if threshold == 0 || threshold > count as u64 {
        return Err(EncodeError::InvalidThreshold { threshold, count });
    }
    Ok(())
}

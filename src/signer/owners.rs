//! Owner configuration as supplied by the caller.

use std::sync::Arc;

use alloy_primitives::Address;

use super::account::SigningAccount;

pub type AccountRef = Arc<dyn SigningAccount>;

/// Who owns an account, before normalisation into a [`super::SignerSet`].
///
/// `module` overrides the default validator address of the kind.
#[derive(Debug, Clone)]
pub enum OwnerSet {
    /// Plain ECDSA owners behind the ownable validator.
    Ecdsa {
        accounts: Vec<AccountRef>,
        threshold: Option<u64>,
        module: Option<Address>,
    },
    /// ECDSA owners with per-owner expiry (positional, `None` = never).
    Ens {
        accounts: Vec<AccountRef>,
        threshold: Option<u64>,
        expirations: Vec<Option<u64>>,
        module: Option<Address>,
    },
    /// WebAuthn passkeys.
    Passkey {
        accounts: Vec<AccountRef>,
        threshold: Option<u64>,
        module: Option<Address>,
    },
    /// Threshold over nested validators. A `None` slot keeps its position.
    MultiFactor {
        validators: Vec<Option<OwnerSet>>,
        threshold: Option<u64>,
        module: Option<Address>,
    },
}

impl OwnerSet {
    pub fn ecdsa(accounts: Vec<AccountRef>) -> Self {
        OwnerSet::Ecdsa {
            accounts,
            threshold: None,
            module: None,
        }
    }

    pub fn passkey(accounts: Vec<AccountRef>) -> Self {
        OwnerSet::Passkey {
            accounts,
            threshold: None,
            module: None,
        }
    }

    pub fn multi_factor(validators: Vec<Option<OwnerSet>>, threshold: u64) -> Self {
        OwnerSet::MultiFactor {
            validators,
            threshold: Some(threshold),
            module: None,
        }
    }

    /// Sets the signing threshold, keeping everything else.
    pub fn with_threshold(mut self, value: u64) -> Self {
        match &mut self {
            OwnerSet::Ecdsa { threshold, .. }
            | OwnerSet::Ens { threshold, .. }
            | OwnerSet::Passkey { threshold, .. }
            | OwnerSet::MultiFactor { threshold, .. } => *threshold = Some(value),
        }
        self
    }

    /// Overrides the validator module address.
    pub fn with_module(mut self, address: Address) -> Self {
        match &mut self {
            OwnerSet::Ecdsa { module, .. }
            | OwnerSet::Ens { module, .. }
            | OwnerSet::Passkey { module, .. }
            | OwnerSet::MultiFactor { module, .. } => *module = Some(address),
        }
        self
    }

    /// Configured threshold, defaulting to 1.
    pub fn threshold(&self) -> u64 {
        match self {
            OwnerSet::Ecdsa { threshold, .. }
            | OwnerSet::Ens { threshold, .. }
            | OwnerSet::Passkey { threshold, .. }
            | OwnerSet::MultiFactor { threshold, .. } => threshold.unwrap_or(1),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            OwnerSet::Ecdsa { .. } => "ecdsa",
            OwnerSet::Ens { .. } => "ens",
            OwnerSet::Passkey { .. } => "passkey",
            OwnerSet::MultiFactor { .. } => "multi-factor",
        }
    }

    /// Nesting depth; a flat owner list has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            OwnerSet::MultiFactor { validators, .. } => {
                1 + validators
                    .iter()
                    .flatten()
                    .map(OwnerSet::depth)
                    .max()
                    .unwrap_or(0)
            }
            _ => 1,
        }
    }
}

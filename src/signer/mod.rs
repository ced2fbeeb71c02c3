//! Signer Model
//!
//! Normalises heterogeneous owner configurations into a uniform [`SignerSet`]
//! and aggregates the signatures of every signer in a set into the packed
//! layout the account's validator expects.
//!
//! ```text
//! OwnerSet ──to_signer_set──▶ SignerSet ──sign(chain, context, payload)──▶ bytes
//! ```

pub mod account;
pub mod owners;
pub mod sign;
pub mod webauthn;

use alloy_primitives::Address;

use crate::module;
use crate::session::{Session, SessionEnableData};

pub use account::{LocalEcdsaAccount, SigningAccount};
pub use owners::{AccountRef, OwnerSet};
pub use sign::{sign, Payload, SignContext, SignPurpose};
pub use webauthn::{PasskeyCredential, WebAuthnAssertion};

/// Deepest allowed signer tree. A flat owner list has depth 1.
pub const MAX_NESTING_DEPTH: usize = 4;

/// Normalised "who must sign".
#[derive(Debug, Clone)]
pub enum SignerSet {
    Owner(OwnerSigners),
    Session {
        session: Box<Session>,
        enable_data: Option<Box<SessionEnableData>>,
    },
    /// Recovery guardians; the threshold is enforced on-chain.
    Guardians { accounts: Vec<AccountRef> },
}

#[derive(Debug, Clone)]
pub enum OwnerSigners {
    Ecdsa { accounts: Vec<AccountRef> },
    Passkey { accounts: Vec<AccountRef> },
    MultiFactor {
        validators: Vec<Option<MultiFactorSigner>>,
    },
}

/// One slot of a multi-factor set.
#[derive(Debug, Clone)]
pub struct MultiFactorSigner {
    /// Positional id, stable even when earlier slots are empty.
    pub id: u64,
    /// Validator module the slot's signature is routed to.
    pub validator: Address,
    pub signers: SignerSet,
}

impl SignerSet {
    pub fn session(session: Session) -> Self {
        SignerSet::Session {
            session: Box::new(session),
            enable_data: None,
        }
    }

    pub fn session_with_enable(session: Session, enable_data: SessionEnableData) -> Self {
        SignerSet::Session {
            session: Box::new(session),
            enable_data: Some(Box::new(enable_data)),
        }
    }

    /// Validator nesting depth. Multi-factor levels count; the session
    /// wrapper does not, so any owner set that can back a permission id can
    /// also sign for it.
    pub fn depth(&self) -> usize {
        match self {
            SignerSet::Owner(OwnerSigners::MultiFactor { validators }) => {
                1 + validators
                    .iter()
                    .flatten()
                    .map(|slot| slot.signers.depth())
                    .max()
                    .unwrap_or(0)
            }
            SignerSet::Session { session, .. } => session.owners.depth(),
            _ => 1,
        }
    }
}

/// Normalises an owner configuration. Total over every owner kind.
pub fn to_signer_set(owners: &OwnerSet) -> SignerSet {
    let signers = match owners {
        OwnerSet::Ecdsa { accounts, .. } | OwnerSet::Ens { accounts, .. } => OwnerSigners::Ecdsa {
            accounts: accounts.clone(),
        },
        OwnerSet::Passkey { accounts, .. } => OwnerSigners::Passkey {
            accounts: accounts.clone(),
        },
        OwnerSet::MultiFactor { validators, .. } => OwnerSigners::MultiFactor {
            validators: validators
                .iter()
                .enumerate()
                .map(|(id, slot)| {
                    slot.as_ref().map(|inner| MultiFactorSigner {
                        id: id as u64,
                        validator: module::validator_address(inner),
                        signers: to_signer_set(inner),
                    })
                })
                .collect(),
        },
    };
    SignerSet::Owner(signers)
}

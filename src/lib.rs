//! Smart account core library
//!
//! Signer aggregation, validator module encoding, session lifecycle and
//! cross-chain intent encoding for modular (ERC-7579) smart accounts, plus
//! settlement tracking against the orchestrator and bundlers.

pub mod account;
pub mod chain;
pub mod config;
pub mod error;
pub mod intent;
pub mod module;
pub mod session;
pub mod settlement;
pub mod signer;
pub mod typed_data;
pub mod wire;

// Re-export public types for convenience
pub use account::{
    vendor_for, AccountKind, AccountSetup, AccountVendor, DeployArgs, GuardianSet, SmartAccount,
};
pub use chain::{Call, ChainReader, RpcChainReader};
pub use config::SdkConfig;
pub use error::{
    Capability, CapabilityError, ConfigError, EncodeError, Error, Result, SettlementError,
    TransportError,
};
pub use intent::{sign_intent, IntentElement, IntentMandate, IntentOp, OpBundle};
pub use module::{Module, ModuleType, ValidatorConfig};
pub use session::{
    permission_id, EnableOutcome, Operation, OperationSubmitter, Session, SessionEnableData,
    SessionLifecycle, SessionState,
};
pub use settlement::{
    BundleResult, BundleStatus, BundlerClient, IntentOpStatus, OrchestratorApi,
    OrchestratorClient, PollPolicy, SettlementOutcome, SettlementTracker,
};
pub use signer::{
    sign, to_signer_set, LocalEcdsaAccount, OwnerSet, Payload, SignContext, SignPurpose,
    SignerSet, SigningAccount,
};
pub use typed_data::{TypedData, TypedDataDomain};

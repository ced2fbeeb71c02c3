//! Session enable state machine.
//!
//! ```text
//! Unknown ──read──▶ NotEnabled ──enable──▶ Enabling ──read──▶ Enabled
//!                        ▲                    │
//!                        └─submission failed──┘
//!                          or settled without enabling
//! ```
//!
//! Every transition out of `Unknown` and into `Enabled` is driven by an
//! `isPermissionEnabled` read. The cached state only prevents duplicate
//! enable submissions while one is in flight; once that submission has
//! settled (see [`SessionLifecycle::settle`]) a read that still reports the
//! session disabled moves it back to `NotEnabled`.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::permission::{self, abi};
use super::{ChainDigest, Session, SessionEnableData};
use crate::chain::{Call, ChainReader};
use crate::error::{ConfigError, EncodeError, Error, SettlementError, TransportError};
use crate::module::{self, smart_sessions::SMART_SESSIONS_ADDRESS};
use crate::settlement::{BundleResult, SettlementOutcome, SettlementTracker};
use crate::signer::{self, to_signer_set, OwnerSet, Payload, SignContext, SignPurpose};
use crate::typed_data::{self, types_from, TypeMap, TypedData, TypedDataDomain};

// ============================================================================
// STATE
// ============================================================================

/// Where a session stands for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Never read.
    #[default]
    Unknown,
    NotEnabled,
    /// An enable operation was submitted but not yet observed on-chain.
    Enabling,
    Enabled,
}

/// Calls to execute from an account on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub chain_id: u64,
    pub account: Address,
    pub calls: Vec<Call>,
}

/// Sends operations the same way any other account operation is sent.
#[async_trait]
pub trait OperationSubmitter: Send + Sync {
    async fn submit(&self, operation: Operation) -> Result<BundleResult, Error>;
}

/// Result of [`SessionLifecycle::enable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableOutcome {
    pub state: SessionState,
    /// Present only when this call submitted an enable operation.
    pub submission: Option<BundleResult>,
}

/// Cached state plus the enable submission still in flight, if any.
#[derive(Debug, Clone, Default)]
struct Tracked {
    state: SessionState,
    submission: Option<BundleResult>,
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Tracks and drives session enablement on one chain.
///
/// Entries are kept for the life of the lifecycle, one per
/// (account, permission id) seen. Use [`SessionLifecycle::reset`] to drop one.
pub struct SessionLifecycle {
    chain_id: u64,
    reader: Arc<dyn ChainReader>,
    submitter: Arc<dyn OperationSubmitter>,
    states: Arc<RwLock<HashMap<(Address, B256), Tracked>>>,
}

impl SessionLifecycle {
    pub fn new(
        chain_id: u64,
        reader: Arc<dyn ChainReader>,
        submitter: Arc<dyn OperationSubmitter>,
    ) -> Self {
        Self {
            chain_id,
            reader,
            submitter,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Last known state, without touching the chain.
    pub async fn state(&self, account: Address, permission_id: B256) -> SessionState {
        self.states
            .read()
            .await
            .get(&(account, permission_id))
            .map(|tracked| tracked.state)
            .unwrap_or_default()
    }

    /// Enable submission still in flight for the session, if any.
    pub async fn pending_submission(
        &self,
        account: Address,
        permission_id: B256,
    ) -> Option<BundleResult> {
        self.states
            .read()
            .await
            .get(&(account, permission_id))
            .and_then(|tracked| tracked.submission.clone())
    }

    /// Forgets everything cached for the session; the next call reads the chain.
    pub async fn reset(&self, account: Address, permission_id: B256) {
        if self
            .states
            .write()
            .await
            .remove(&(account, permission_id))
            .is_some()
        {
            info!("Session {} for {} reset", permission_id, account);
        }
    }

    /// `isPermissionEnabled(permissionId, account)` on the smart sessions validator.
    pub async fn is_enabled(&self, account: Address, permission_id: B256) -> Result<bool, Error> {
        let call = abi::isPermissionEnabledCall {
            permissionId: permission_id,
            account,
        };
        let data = self
            .reader
            .call(SMART_SESSIONS_ADDRESS, Bytes::from(call.abi_encode()))
            .await?;
        let decoded = abi::isPermissionEnabledCall::abi_decode_returns(&data, true)
            .map_err(|e| decode_error(&e))?;
        Ok(decoded._0)
    }

    /// Session nonce the enable typed data must commit to.
    pub async fn nonce(&self, account: Address, permission_id: B256) -> Result<U256, Error> {
        let call = abi::getNonceCall {
            permissionId: permission_id,
            account,
        };
        let data = self
            .reader
            .call(SMART_SESSIONS_ADDRESS, Bytes::from(call.abi_encode()))
            .await?;
        let decoded =
            abi::getNonceCall::abi_decode_returns(&data, true).map_err(|e| decode_error(&e))?;
        Ok(decoded._0)
    }

    /// Reads the chain and updates the cached state.
    ///
    /// A session that is not enabled yet stays `Enabling` only while its enable
    /// submission is in flight.
    pub async fn refresh(&self, account: Address, session: &Session) -> Result<SessionState, Error> {
        let permission_id = permission::permission_id(session)?;
        self.refresh_id(account, permission_id).await
    }

    async fn refresh_id(&self, account: Address, permission_id: B256) -> Result<SessionState, Error> {
        let enabled = self.is_enabled(account, permission_id).await?;

        let mut states = self.states.write().await;
        let tracked = states.entry((account, permission_id)).or_default();
        let in_flight = tracked.submission.is_some();
        let next = match (enabled, tracked.state) {
            (true, _) => SessionState::Enabled,
            (false, SessionState::Enabling) if in_flight => SessionState::Enabling,
            (false, _) => SessionState::NotEnabled,
        };
        if next != tracked.state {
            info!(
                "Session {} for {}: {:?} -> {:?}",
                permission_id, account, tracked.state, next
            );
        }
        tracked.state = next;
        if next != SessionState::Enabling {
            tracked.submission = None;
        }
        Ok(next)
    }

    /// Enables `session` for `account` unless it already is.
    ///
    /// # Returns
    ///
    /// * `Ok(EnableOutcome)` - `Enabled` with no submission when already enabled,
    ///   `Enabling` with the submission handle otherwise
    /// * `Err(Error)` - Read, encoding or submission failure
    pub async fn enable(&self, account: Address, session: &Session) -> Result<EnableOutcome, Error> {
        let sol = permission::to_sol(session)?;
        let permission_id = keccak256(sol.abi_encode());
        let operation = Operation {
            chain_id: self.chain_id,
            account,
            calls: vec![Call::new(
                SMART_SESSIONS_ADDRESS,
                abi::enableSessionsCall { sessions: vec![sol] }.abi_encode(),
            )],
        };

        let observed = self.refresh_id(account, permission_id).await?;
        if observed == SessionState::Enabled {
            debug!("Session {} already enabled for {}", permission_id, account);
            return Ok(EnableOutcome {
                state: SessionState::Enabled,
                submission: None,
            });
        }

        {
            let mut states = self.states.write().await;
            let tracked = states.entry((account, permission_id)).or_default();
            match tracked.state {
                SessionState::Enabling | SessionState::Enabled => {
                    return Ok(EnableOutcome {
                        state: tracked.state,
                        submission: None,
                    });
                }
                _ => tracked.state = SessionState::Enabling,
            }
        }

        match self.submitter.submit(operation).await {
            Ok(submission) => {
                info!(
                    "Session {} enable submitted for {} on chain {}",
                    permission_id, account, self.chain_id
                );
                if let Some(tracked) = self.states.write().await.get_mut(&(account, permission_id)) {
                    tracked.submission = Some(submission.clone());
                }
                Ok(EnableOutcome {
                    state: SessionState::Enabling,
                    submission: Some(submission),
                })
            }
            Err(e) => {
                warn!("Session {} enable submission failed: {}", permission_id, e);
                self.states.write().await.insert(
                    (account, permission_id),
                    Tracked {
                        state: SessionState::NotEnabled,
                        submission: None,
                    },
                );
                Err(e)
            }
        }
    }

    /// Waits for the in-flight enable submission to settle, then reads the chain.
    ///
    /// A submission that ends `FAILED` or `EXPIRED`, or whose user operation
    /// reverted, leaves the session `NotEnabled` so `enable` submits again.
    /// Poll timeouts and transport errors are returned with the session still
    /// `Enabling`.
    pub async fn settle(
        &self,
        account: Address,
        session: &Session,
        tracker: &SettlementTracker,
    ) -> Result<SessionState, Error> {
        let permission_id = permission::permission_id(session)?;
        let Some(submission) = self.pending_submission(account, permission_id).await else {
            return self.refresh_id(account, permission_id).await;
        };

        match tracker.wait(&submission).await {
            Ok(SettlementOutcome::UserOperation(receipt)) if !receipt.success => {
                warn!("Session {} enable operation reverted", permission_id);
            }
            Ok(_) => {}
            Err(Error::Settlement(SettlementError::Terminal { id, status })) => {
                warn!(
                    "Session {} enable bundle {} ended with status {}",
                    permission_id, id, status.status
                );
            }
            Err(e) => return Err(e),
        }

        if let Some(tracked) = self.states.write().await.get_mut(&(account, permission_id)) {
            tracked.submission = None;
        }
        self.refresh_id(account, permission_id).await
    }
}

fn decode_error(e: &alloy_sol_types::Error) -> Error {
    TransportError::Decode {
        url: "smart sessions".to_string(),
        message: e.to_string(),
    }
    .into()
}

// ============================================================================
// ENABLE TYPED DATA
// ============================================================================

pub const ENABLE_DOMAIN_NAME: &str = "SmartSession";
pub const ENABLE_DOMAIN_VERSION: &str = "1";

fn enable_types() -> TypeMap {
    types_from(&[
        (
            "MultiChainSession",
            &[("sessionsAndChainIds", "ChainSession[]")],
        ),
        (
            "ChainSession",
            &[("chainId", "uint64"), ("session", "SignedSession")],
        ),
        (
            "SignedSession",
            &[
                ("account", "address"),
                ("sessionValidator", "address"),
                ("sessionValidatorInitData", "bytes"),
                ("salt", "bytes32"),
                ("userOpPolicies", "PolicyData[]"),
                ("erc7739Policies", "ERC7739Data"),
                ("actions", "ActionData[]"),
                ("permitERC4337Paymaster", "bool"),
                ("smartSession", "address"),
                ("nonce", "uint256"),
            ],
        ),
        ("PolicyData", &[("policy", "address"), ("initData", "bytes")]),
        (
            "ERC7739Data",
            &[
                ("allowedERC7739Content", "ERC7739Context[]"),
                ("erc1271Policies", "PolicyData[]"),
            ],
        ),
        (
            "ERC7739Context",
            &[("appDomainSeparator", "bytes32"), ("contentName", "string[]")],
        ),
        (
            "ActionData",
            &[
                ("actionTargetSelector", "bytes4"),
                ("actionTarget", "address"),
                ("actionPolicies", "PolicyData[]"),
            ],
        ),
    ])
}

fn enable_domain() -> TypedDataDomain {
    TypedDataDomain {
        name: Some(ENABLE_DOMAIN_NAME.to_string()),
        version: Some(ENABLE_DOMAIN_VERSION.to_string()),
        chain_id: None,
        verifying_contract: Some(SMART_SESSIONS_ADDRESS),
        salt: None,
    }
}

fn policies_json(policies: &[abi::PolicyData]) -> Value {
    policies
        .iter()
        .map(|p| json!({ "policy": p.policy, "initData": p.initData }))
        .collect()
}

fn signed_session_json(account: Address, session: &abi::Session, nonce: U256) -> Value {
    let erc7739 = &session.erc7739Policies;
    json!({
        "account": account,
        "sessionValidator": session.sessionValidator,
        "sessionValidatorInitData": session.sessionValidatorInitData,
        "salt": session.salt,
        "userOpPolicies": policies_json(&session.userOpPolicies),
        "erc7739Policies": {
            "allowedERC7739Content": erc7739
                .allowedERC7739Content
                .iter()
                .map(|c| json!({
                    "appDomainSeparator": c.appDomainSeparator,
                    "contentName": c.contentName,
                }))
                .collect::<Vec<_>>(),
            "erc1271Policies": policies_json(&erc7739.erc1271Policies),
        },
        "actions": session
            .actions
            .iter()
            .map(|a| json!({
                "actionTargetSelector": a.actionTargetSelector,
                "actionTarget": a.actionTarget,
                "actionPolicies": policies_json(&a.actionPolicies),
            }))
            .collect::<Vec<_>>(),
        "permitERC4337Paymaster": session.permitERC4337Paymaster,
        "smartSession": SMART_SESSIONS_ADDRESS,
        "nonce": nonce.to_string(),
    })
}

/// EIP-712 document the account owners sign to enable one session on
/// several chains at once.
///
/// # Arguments
///
/// * `account` - The smart account the session is enabled for
/// * `sessions` - `(chain id, session)` pairs, in the order they are signed
/// * `nonce` - Current session nonce of the account
pub fn enable_typed_data(
    account: Address,
    sessions: &[(u64, &Session)],
    nonce: U256,
) -> Result<TypedData, Error> {
    if sessions.is_empty() {
        return Err(ConfigError::Invalid("no session to enable".into()).into());
    }
    let entries = sessions
        .iter()
        .map(|(chain_id, session)| {
            Ok(json!({
                "chainId": chain_id,
                "session": signed_session_json(account, &permission::to_sol(session)?, nonce),
            }))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(TypedData::new(
        enable_domain(),
        enable_types(),
        "MultiChainSession",
        json!({ "sessionsAndChainIds": entries }),
    ))
}

/// `hashStruct(SignedSession)` per chain, in input order.
pub fn chain_digests(
    account: Address,
    sessions: &[(u64, &Session)],
    nonce: U256,
) -> Result<Vec<ChainDigest>, Error> {
    let types = enable_types();
    sessions
        .iter()
        .map(|(chain_id, session)| {
            let message = signed_session_json(account, &permission::to_sol(session)?, nonce);
            Ok(ChainDigest {
                chain_id: *chain_id,
                session_digest: typed_data::hash_struct(&types, "SignedSession", &message)?,
            })
        })
        .collect()
}

/// Has `owners` sign the enable typed data and packages the result for an
/// `ENABLE` mode session signature on `chain_id`.
///
/// `permission_enable_sig` is `ownerValidator ‖ ownerSignature` so the smart
/// sessions validator knows which validator checks the owners.
pub async fn sign_enable(
    owners: &OwnerSet,
    account: Address,
    chain_id: u64,
    sessions: &[(u64, &Session)],
    nonce: U256,
) -> Result<SessionEnableData, Error> {
    let index = sessions
        .iter()
        .position(|(id, _)| *id == chain_id)
        .ok_or(ConfigError::UnknownChain { chain_id })?;
    let chain_digest_index = u8::try_from(index).map_err(|_| {
        EncodeError::InvalidInput(format!("{} chains do not fit a uint8 index", sessions.len()))
    })?;

    let typed = enable_typed_data(account, sessions, nonce)?;
    let hash = typed.signing_hash()?;
    let context = SignContext::new(account, SignPurpose::UserOperation);
    let signature = signer::sign(&to_signer_set(owners), chain_id, &context, &Payload::Hash(hash)).await?;

    let validator = module::validator_address(owners);
    let mut permission_enable_sig = Vec::with_capacity(20 + signature.len());
    permission_enable_sig.extend_from_slice(validator.as_slice());
    permission_enable_sig.extend_from_slice(&signature);

    Ok(SessionEnableData {
        chain_digest_index,
        chain_digests: chain_digests(account, sessions, nonce)?,
        permission_enable_sig: permission_enable_sig.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{LocalEcdsaAccount, SigningAccount};
    use alloy_primitives::{address, b256};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const ACCOUNT: Address = address!("1111111111111111111111111111111111111111");

    fn owner() -> Arc<LocalEcdsaAccount> {
        Arc::new(
            LocalEcdsaAccount::from_hex(
                "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
            )
            .unwrap(),
        )
    }

    fn session() -> Session {
        Session::new(OwnerSet::ecdsa(vec![owner()]))
    }

    #[derive(Default)]
    struct FakeChain {
        enabled: AtomicBool,
    }

    #[async_trait]
    impl ChainReader for FakeChain {
        async fn get_code(&self, _address: Address) -> Result<Bytes, TransportError> {
            Ok(Bytes::new())
        }

        async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TransportError> {
            assert_eq!(to, SMART_SESSIONS_ADDRESS);
            if data[..4] == abi::getNonceCall::SELECTOR {
                return Ok(U256::from(7).abi_encode().into());
            }
            assert_eq!(data[..4], abi::isPermissionEnabledCall::SELECTOR);
            Ok(self.enabled.load(Ordering::SeqCst).abi_encode().into())
        }
    }

    #[derive(Default)]
    struct CountingSubmitter {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl OperationSubmitter for CountingSubmitter {
        async fn submit(&self, operation: Operation) -> Result<BundleResult, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ConfigError::Invalid("rejected".into()).into());
            }
            assert_eq!(operation.calls[0].to, SMART_SESSIONS_ADDRESS);
            assert_eq!(operation.calls[0].data[..4], abi::enableSessionsCall::SELECTOR);
            Ok(BundleResult::Bundle { id: "enable-1".into() })
        }
    }

    fn lifecycle(
        chain: Arc<FakeChain>,
        submitter: Arc<CountingSubmitter>,
    ) -> SessionLifecycle {
        SessionLifecycle::new(8453, chain, submitter)
    }

    #[tokio::test]
    async fn test_state_starts_unknown() {
        let lifecycle = lifecycle(Arc::default(), Arc::default());
        let pid = permission::permission_id(&session()).unwrap();
        assert_eq!(lifecycle.state(ACCOUNT, pid).await, SessionState::Unknown);
    }

    #[tokio::test]
    async fn test_enable_submits_once_and_moves_to_enabling() {
        let chain = Arc::new(FakeChain::default());
        let submitter = Arc::new(CountingSubmitter::default());
        let lifecycle = lifecycle(chain.clone(), submitter.clone());
        let pid = permission::permission_id(&session()).unwrap();

        let first = lifecycle.enable(ACCOUNT, &session()).await.unwrap();
        assert_eq!(first.state, SessionState::Enabling);
        assert!(first.submission.is_some());

        let second = lifecycle.enable(ACCOUNT, &session()).await.unwrap();
        assert_eq!(second.state, SessionState::Enabling);
        assert!(second.submission.is_none());
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);

        chain.enabled.store(true, Ordering::SeqCst);
        assert_eq!(
            lifecycle.refresh(ACCOUNT, &session()).await.unwrap(),
            SessionState::Enabled
        );
        assert_eq!(lifecycle.state(ACCOUNT, pid).await, SessionState::Enabled);
    }

    #[tokio::test]
    async fn test_enable_on_enabled_session_is_a_noop() {
        let chain = Arc::new(FakeChain::default());
        chain.enabled.store(true, Ordering::SeqCst);
        let submitter = Arc::new(CountingSubmitter::default());
        let lifecycle = lifecycle(chain, submitter.clone());

        let outcome = lifecycle.enable(ACCOUNT, &session()).await.unwrap();
        assert_eq!(outcome.state, SessionState::Enabled);
        assert!(outcome.submission.is_none());
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_submission_returns_to_not_enabled() {
        let submitter = Arc::new(CountingSubmitter {
            fail: true,
            ..Default::default()
        });
        let lifecycle = lifecycle(Arc::default(), submitter);
        let pid = permission::permission_id(&session()).unwrap();

        assert!(lifecycle.enable(ACCOUNT, &session()).await.is_err());
        assert_eq!(lifecycle.state(ACCOUNT, pid).await, SessionState::NotEnabled);
    }

    #[tokio::test]
    async fn test_encoding_failure_leaves_state_untouched() {
        let submitter = Arc::new(CountingSubmitter::default());
        let lifecycle = lifecycle(Arc::default(), submitter.clone());
        let broken = Session::new(OwnerSet::ecdsa(Vec::new()));

        assert!(lifecycle.enable(ACCOUNT, &broken).await.is_err());
        assert!(lifecycle.states.read().await.is_empty());
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_settled_submission_no_longer_holds_enabling() {
        let chain = Arc::new(FakeChain::default());
        let submitter = Arc::new(CountingSubmitter::default());
        let lifecycle = lifecycle(chain, submitter.clone());
        let pid = permission::permission_id(&session()).unwrap();

        lifecycle.enable(ACCOUNT, &session()).await.unwrap();
        assert!(lifecycle.pending_submission(ACCOUNT, pid).await.is_some());

        // Submission settled elsewhere without enabling the session.
        if let Some(tracked) = lifecycle.states.write().await.get_mut(&(ACCOUNT, pid)) {
            tracked.submission = None;
        }
        assert_eq!(
            lifecycle.refresh(ACCOUNT, &session()).await.unwrap(),
            SessionState::NotEnabled
        );
        lifecycle.enable(ACCOUNT, &session()).await.unwrap();
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nonce_is_read_from_smart_sessions() {
        let lifecycle = lifecycle(Arc::default(), Arc::default());
        let pid = permission::permission_id(&session()).unwrap();
        assert_eq!(lifecycle.nonce(ACCOUNT, pid).await.unwrap(), U256::from(7));
    }

    #[test]
    fn test_chain_digest_matches_typed_data_entry() {
        let session = session();
        let sessions = [(1u64, &session), (8453u64, &session)];
        let typed = enable_typed_data(ACCOUNT, &sessions, U256::from(3)).unwrap();
        let digests = chain_digests(ACCOUNT, &sessions, U256::from(3)).unwrap();

        let entry = &typed.message["sessionsAndChainIds"][1]["session"];
        assert_eq!(
            digests[1].session_digest,
            typed_data::hash_struct(&typed.types, "SignedSession", entry).unwrap()
        );
        assert_eq!(digests[0].session_digest, digests[1].session_digest);
        assert_eq!(digests[1].chain_id, 8453);
        assert!(typed.signing_hash().is_ok());
    }

    #[test]
    fn test_enable_hash_commits_to_nonce() {
        let session = session();
        let sessions = [(1u64, &session)];
        let a = enable_typed_data(ACCOUNT, &sessions, U256::from(0)).unwrap();
        let b = enable_typed_data(ACCOUNT, &sessions, U256::from(1)).unwrap();
        assert_ne!(a.signing_hash().unwrap(), b.signing_hash().unwrap());
    }

    #[tokio::test]
    async fn test_sign_enable_prefixes_owner_validator() {
        let session = session().with_salt(b256!(
            "0000000000000000000000000000000000000000000000000000000000000002"
        ));
        let sessions = [(1u64, &session), (8453u64, &session)];
        let owners = OwnerSet::ecdsa(vec![owner()]);

        let enable = sign_enable(&owners, ACCOUNT, 8453, &sessions, U256::ZERO)
            .await
            .unwrap();

        assert_eq!(enable.chain_digest_index, 1);
        assert_eq!(enable.chain_digests.len(), 2);
        assert_eq!(
            &enable.permission_enable_sig[..20],
            module::ownable::OWNABLE_VALIDATOR_ADDRESS.as_slice()
        );
        let hash = enable_typed_data(ACCOUNT, &sessions, U256::ZERO)
            .unwrap()
            .signing_hash()
            .unwrap();
        assert_eq!(
            &enable.permission_enable_sig[20..],
            &owner().sign_message(hash).await.unwrap()[..]
        );
    }

    #[tokio::test]
    async fn test_sign_enable_requires_current_chain() {
        let session = session();
        let err = sign_enable(
            &OwnerSet::ecdsa(vec![owner()]),
            ACCOUNT,
            10,
            &[(1, &session)],
            U256::ZERO,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnknownChain { chain_id: 10 })
        ));
    }
}

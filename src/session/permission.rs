//! ABI form of a session and its permission id.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolValue;

use super::{Action, Policy, Session, SessionEnableData};
use crate::error::Error;
use crate::module;

/// Solidity types of the smart sessions validator.
pub mod abi {
    alloy_sol_types::sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct PolicyData {
            address policy;
            bytes initData;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ActionData {
            bytes4 actionTargetSelector;
            address actionTarget;
            PolicyData[] actionPolicies;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ERC7739Context {
            bytes32 appDomainSeparator;
            string[] contentName;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ERC7739Data {
            ERC7739Context[] allowedERC7739Content;
            PolicyData[] erc1271Policies;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Session {
            address sessionValidator;
            bytes sessionValidatorInitData;
            bytes32 salt;
            PolicyData[] userOpPolicies;
            ERC7739Data erc7739Policies;
            ActionData[] actions;
            bool permitERC4337Paymaster;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct ChainDigest {
            uint64 chainId;
            bytes32 sessionDigest;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct EnableSession {
            uint8 chainDigestIndex;
            ChainDigest[] hashesAndChainIds;
            Session sessionToEnable;
            bytes permissionEnableSig;
        }

        function isPermissionEnabled(bytes32 permissionId, address account) external view returns (bool);

        function enableSessions(Session[] sessions) external returns (bytes32[] permissionIds);

        function getNonce(bytes32 permissionId, address account) external view returns (uint256);
    }
}

fn policy_data(policy: &Policy) -> abi::PolicyData {
    abi::PolicyData {
        policy: policy.address,
        initData: policy.init_data.clone(),
    }
}

fn action_data(action: &Action) -> abi::ActionData {
    abi::ActionData {
        actionTargetSelector: action.selector,
        actionTarget: action.target,
        actionPolicies: action.policies.iter().map(policy_data).collect(),
    }
}

/// Converts a session into the validator's ABI struct.
///
/// The session validator is the owner set's own validator module, configured
/// with the owners' `initData`. An empty action list becomes the fallback
/// action.
pub fn to_sol(session: &Session) -> Result<abi::Session, Error> {
    let validator = module::encode_owner_set(&session.owners)?;

    let actions = if session.actions.is_empty() {
        vec![action_data(&Action::fallback())]
    } else {
        session.actions.iter().map(action_data).collect()
    };

    let erc7739 = session
        .signing
        .as_ref()
        .map(|signing| abi::ERC7739Data {
            allowedERC7739Content: signing
                .allowed_contents
                .iter()
                .map(|content| abi::ERC7739Context {
                    appDomainSeparator: content.app_domain_separator,
                    contentName: content.content_names.clone(),
                })
                .collect(),
            erc1271Policies: signing.policies.iter().map(policy_data).collect(),
        })
        .unwrap_or(abi::ERC7739Data {
            allowedERC7739Content: Vec::new(),
            erc1271Policies: Vec::new(),
        });

    Ok(abi::Session {
        sessionValidator: validator.address,
        sessionValidatorInitData: validator.init_data,
        salt: session.salt,
        userOpPolicies: session.policies.iter().map(policy_data).collect(),
        erc7739Policies: erc7739,
        actions,
        permitERC4337Paymaster: session.permit_paymaster,
    })
}

/// `keccak256(abi.encode(Session))`.
pub fn permission_id(session: &Session) -> Result<B256, Error> {
    Ok(keccak256(to_sol(session)?.abi_encode()))
}

pub(crate) fn enable_session_sol(
    session: &Session,
    enable: &SessionEnableData,
) -> Result<abi::EnableSession, Error> {
    Ok(abi::EnableSession {
        chainDigestIndex: enable.chain_digest_index,
        hashesAndChainIds: enable
            .chain_digests
            .iter()
            .map(|digest| abi::ChainDigest {
                chainId: digest.chain_id,
                sessionDigest: digest.session_digest,
            })
            .collect(),
        sessionToEnable: to_sol(session)?,
        permissionEnableSig: enable.permission_enable_sig.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ownable::OWNABLE_VALIDATOR_ADDRESS;
    use crate::session::{FALLBACK_TARGET, SUDO_POLICY_ADDRESS};
    use crate::signer::{LocalEcdsaAccount, OwnerSet};
    use alloy_primitives::b256;
    use std::sync::Arc;

    fn session() -> Session {
        let key = LocalEcdsaAccount::from_hex(
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        Session::new(OwnerSet::ecdsa(vec![Arc::new(key)]))
    }

    #[test]
    fn test_permission_id_is_stable() {
        assert_eq!(
            permission_id(&session()).unwrap(),
            permission_id(&session()).unwrap()
        );
    }

    #[test]
    fn test_permission_id_changes_with_salt() {
        let salted = session().with_salt(b256!(
            "0000000000000000000000000000000000000000000000000000000000000001"
        ));
        assert_ne!(
            permission_id(&session()).unwrap(),
            permission_id(&salted).unwrap()
        );
    }

    #[test]
    fn test_permission_id_changes_with_policies() {
        let limited = session().with_policy(Policy::usage_limit(3));
        assert_ne!(
            permission_id(&session()).unwrap(),
            permission_id(&limited).unwrap()
        );
    }

    #[test]
    fn test_session_validator_is_owner_validator() {
        let sol = to_sol(&session()).unwrap();
        assert_eq!(sol.sessionValidator, OWNABLE_VALIDATOR_ADDRESS);
        assert_eq!(
            sol.sessionValidatorInitData,
            module::encode_owner_set(&session().owners).unwrap().init_data
        );
    }

    #[test]
    fn test_empty_actions_become_fallback() {
        let sol = to_sol(&session()).unwrap();
        assert_eq!(sol.actions.len(), 1);
        assert_eq!(sol.actions[0].actionTarget, FALLBACK_TARGET);
        assert_eq!(sol.actions[0].actionPolicies[0].policy, SUDO_POLICY_ADDRESS);
    }

    #[test]
    fn test_permission_id_is_hash_of_abi_struct() {
        let session = session();
        let encoded = to_sol(&session).unwrap().abi_encode();
        // a dynamic struct is encoded behind a single offset word
        assert_eq!(&encoded[..32], &alloy_primitives::U256::from(32).to_be_bytes::<32>());
        assert_eq!(permission_id(&session).unwrap(), keccak256(encoded));
    }
}

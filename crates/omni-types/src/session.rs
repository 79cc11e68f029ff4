//! Scoped session grants.
//!
//! A session is identified on-chain by its permission id, which is always
//! recomputed from the session content and never assigned externally.

use crate::{
	standards::erc7739::contents_name,
	utils::constants::{
		FALLBACK_TARGET_FLAG, FALLBACK_TARGET_SELECTOR_FLAG, OWNABLE_VALIDATOR_ADDRESS,
		SUDO_POLICY_ADDRESS,
	},
};
use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use serde::{Deserialize, Serialize};

// Smart Sessions module ABI
#[allow(clippy::too_many_arguments)]
pub mod interfaces {
	use alloy_sol_types::sol;

	sol! {
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
		struct SessionData {
			address sessionValidator;
			bytes sessionValidatorInitData;
			bytes32 salt;
			PolicyData[] userOpPolicies;
			ERC7739Data erc7739Policies;
			ActionData[] actions;
			bool permitERC4337Paymaster;
		}

		interface ISmartSession {
			function enableSessions(SessionData[] memory sessions) external returns (bytes32[] memory permissionIds);
			function isPermissionEnabled(bytes32 permissionId, address account) external view returns (bool);
		}
	}
}

/// Signers allowed to act under the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOwners {
	pub accounts: Vec<Address>,
	#[serde(default = "default_threshold")]
	pub threshold: u64,
}

fn default_threshold() -> u64 {
	1
}

/// A policy contract and its initialisation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
	pub policy: Address,
	#[serde(default)]
	pub init_data: Bytes,
}

/// A contract function the session may call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAction {
	pub target: Address,
	pub selector: FixedBytes<4>,
	#[serde(default)]
	pub policies: Vec<PolicyConfig>,
}

/// A scoped permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	#[serde(default = "default_validator")]
	pub validator: Address,
	pub owners: SessionOwners,
	#[serde(default)]
	pub actions: Vec<SessionAction>,
	/// ERC-7739 contents names the session may co-sign.
	#[serde(default)]
	pub allowed_contents: Vec<String>,
	#[serde(default)]
	pub salt: B256,
}

fn default_validator() -> Address {
	OWNABLE_VALIDATOR_ADDRESS
}

impl Session {
	/// Init data of the ownable session validator: `abi.encode(threshold, owners)`.
	///
	/// Owners are sorted ascending so the id does not depend on input order.
	pub fn validator_init_data(&self) -> Bytes {
		let mut owners = self.owners.accounts.clone();
		owners.sort();
		(U256::from(self.owners.threshold), owners).abi_encode_params().into()
	}

	/// `keccak256(abi.encode(validator, initData, salt))`.
	pub fn permission_id(&self) -> B256 {
		keccak256((self.validator, self.validator_init_data(), self.salt).abi_encode_params())
	}

	/// True when the session may co-sign contents of the given type string.
	pub fn allows_contents(&self, contents_type: &str) -> bool {
		match contents_name(contents_type) {
			Ok(name) => self.allowed_contents.iter().any(|allowed| allowed == name),
			Err(_) => false,
		}
	}

	/// Smart Sessions `SessionData` for `enableSessions`.
	///
	/// A session without actions receives the fallback action under sudo policy.
	pub fn to_session_data(&self, app_domain_separator: B256) -> interfaces::SessionData {
		use interfaces::*;

		let sudo = || PolicyData { policy: SUDO_POLICY_ADDRESS, initData: Bytes::new() };
		let to_policies = |policies: &[PolicyConfig]| -> Vec<PolicyData> {
			if policies.is_empty() {
				return vec![sudo()];
			}
			policies
				.iter()
				.map(|p| PolicyData { policy: p.policy, initData: p.init_data.clone() })
				.collect()
		};

		let actions = if self.actions.is_empty() {
			vec![ActionData {
				actionTargetSelector: FixedBytes(FALLBACK_TARGET_SELECTOR_FLAG),
				actionTarget: FALLBACK_TARGET_FLAG,
				actionPolicies: vec![sudo()],
			}]
		} else {
			self.actions
				.iter()
				.map(|action| ActionData {
					actionTargetSelector: action.selector,
					actionTarget: action.target,
					actionPolicies: to_policies(&action.policies),
				})
				.collect()
		};

		SessionData {
			sessionValidator: self.validator,
			sessionValidatorInitData: self.validator_init_data(),
			salt: self.salt,
			userOpPolicies: vec![],
			erc7739Policies: ERC7739Data {
				allowedERC7739Content: vec![ERC7739Context {
					appDomainSeparator: app_domain_separator,
					contentName: self.allowed_contents.clone(),
				}],
				erc1271Policies: vec![sudo()],
			},
			actions,
			permitERC4337Paymaster: true,
		}
	}

	/// Calldata of `enableSessions([session])` on the Smart Sessions module.
	pub fn enable_calldata(&self, app_domain_separator: B256) -> Bytes {
		interfaces::ISmartSession::enableSessionsCall {
			sessions: vec![self.to_session_data(app_domain_separator)],
		}
		.abi_encode()
		.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{standards::compact::MULTICHAIN_COMPACT_TYPE, utils::tests::builders::SessionBuilder};
	use alloy_primitives::address;

	#[test]
	fn test_permission_id_is_recomputed_and_stable() {
		let session = SessionBuilder::new().build();
		assert_eq!(session.permission_id(), session.clone().permission_id());

		let expected = keccak256(
			(session.validator, session.validator_init_data(), session.salt).abi_encode_params(),
		);
		assert_eq!(session.permission_id(), expected);
	}

	#[test]
	fn test_permission_id_ignores_owner_order() {
		let a = address!("1111111111111111111111111111111111111111");
		let b = address!("2222222222222222222222222222222222222222");

		let forward = SessionBuilder::new().with_owners(vec![a, b], 1).build();
		let backward = SessionBuilder::new().with_owners(vec![b, a], 1).build();
		assert_eq!(forward.permission_id(), backward.permission_id());
	}

	#[test]
	fn test_permission_id_depends_on_content() {
		let session = SessionBuilder::new().build();

		let salted = SessionBuilder::new().with_salt(B256::repeat_byte(0x01)).build();
		assert_ne!(session.permission_id(), salted.permission_id());

		let mut threshold = session.clone();
		threshold.owners.threshold = 2;
		assert_ne!(session.permission_id(), threshold.permission_id());
	}

	#[test]
	fn test_allows_contents() {
		let session = SessionBuilder::new().build();
		assert!(session.allows_contents(MULTICHAIN_COMPACT_TYPE));

		let restricted = SessionBuilder::new().with_allowed_contents(vec![]).build();
		assert!(!restricted.allows_contents(MULTICHAIN_COMPACT_TYPE));
		assert!(!session.allows_contents("not a type"));
	}

	#[test]
	fn test_session_data_uses_fallback_action() {
		let session = SessionBuilder::new().build();
		let data = session.to_session_data(B256::repeat_byte(0xaa));

		assert_eq!(data.actions.len(), 1);
		assert_eq!(data.actions[0].actionTarget, FALLBACK_TARGET_FLAG);
		assert_eq!(data.actions[0].actionPolicies[0].policy, SUDO_POLICY_ADDRESS);
		assert!(data.permitERC4337Paymaster);
		assert_eq!(
			data.erc7739Policies.allowedERC7739Content[0].contentName,
			vec!["MultichainCompact".to_string()]
		);
	}

	#[test]
	fn test_enable_calldata_decodes() {
		let session = SessionBuilder::new().build();
		let calldata = session.enable_calldata(B256::ZERO);

		let decoded = interfaces::ISmartSession::enableSessionsCall::abi_decode(&calldata).unwrap();
		assert_eq!(decoded.sessions, vec![session.to_session_data(B256::ZERO)]);
	}
}

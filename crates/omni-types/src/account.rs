//! Account configuration and owner schemes.

use crate::secret_string::SecretString;
use alloy_primitives::{aliases::U192, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

pub use crate::utils::constants::ContractAddresses;

/// Smart-account implementation variant.
///
/// The variant decides how the validator module is encoded in the
/// EntryPoint nonce key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
	Nexus,
	Safe,
	Kernel,
}

impl AccountKind {
	/// EntryPoint nonce key selecting `validator` for this account kind.
	pub fn nonce_key(&self, validator: Address) -> U192 {
		let mut key = [0u8; 24];
		match self {
			// 0x000000 ‖ validation mode 0x00 ‖ validator
			AccountKind::Nexus => key[4..].copy_from_slice(validator.as_slice()),
			// validator ‖ 0x00000000
			AccountKind::Safe => key[..20].copy_from_slice(validator.as_slice()),
			// mode 0x00 ‖ type 0x01 ‖ validator ‖ 0x0000
			AccountKind::Kernel => {
				key[1] = 0x01;
				key[2..22].copy_from_slice(validator.as_slice());
			},
		}
		U192::from_be_bytes(key)
	}
}

impl std::fmt::Display for AccountKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AccountKind::Nexus => write!(f, "nexus"),
			AccountKind::Safe => write!(f, "safe"),
			AccountKind::Kernel => write!(f, "kernel"),
		}
	}
}

/// How the account owners authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerConfig {
	/// One or more ECDSA keys with a signing threshold.
	Ecdsa { owners: Vec<Address>, threshold: usize },
	/// A WebAuthn credential set.
	Passkey { public_key_x: U256, public_key_y: U256, credential_ids: Vec<B256> },
}

impl OwnerConfig {
	pub fn is_threshold(&self) -> bool {
		matches!(self, OwnerConfig::Ecdsa { threshold, .. } if *threshold > 1)
	}
}

/// Immutable configuration of one smart account.
#[derive(Debug, Clone)]
pub struct AccountConfig {
	pub address: Address,
	pub kind: AccountKind,
	pub owners: OwnerConfig,
	/// Deployment code attached to the first user operation of an undeployed account.
	pub init_code: Option<Bytes>,
	/// Credential for the orchestrator service.
	pub api_key: SecretString,
	pub contracts: ContractAddresses,
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const VALIDATOR: Address = address!("2483DA3A338895199E5e538530213157e931Bf06");

	#[test]
	fn test_nonce_keys_per_kind() {
		let nexus = AccountKind::Nexus.nonce_key(VALIDATOR).to_be_bytes::<24>();
		assert_eq!(&nexus[..4], &[0, 0, 0, 0]);
		assert_eq!(&nexus[4..], VALIDATOR.as_slice());

		let safe = AccountKind::Safe.nonce_key(VALIDATOR).to_be_bytes::<24>();
		assert_eq!(&safe[..20], VALIDATOR.as_slice());
		assert_eq!(&safe[20..], &[0, 0, 0, 0]);

		let kernel = AccountKind::Kernel.nonce_key(VALIDATOR).to_be_bytes::<24>();
		assert_eq!(&kernel[..2], &[0x00, 0x01]);
		assert_eq!(&kernel[2..22], VALIDATOR.as_slice());
		assert_eq!(&kernel[22..], &[0, 0]);
	}

	#[test]
	fn test_account_kind_serde() {
		let kind: AccountKind = serde_json::from_str("\"kernel\"").unwrap();
		assert_eq!(kind, AccountKind::Kernel);
		assert_eq!(kind.to_string(), "kernel");
	}

	#[test]
	fn test_is_threshold() {
		let single = OwnerConfig::Ecdsa { owners: vec![VALIDATOR], threshold: 1 };
		assert!(!single.is_threshold());

		let multi = OwnerConfig::Ecdsa { owners: vec![VALIDATOR, Address::ZERO], threshold: 2 };
		assert!(multi.is_threshold());
	}
}

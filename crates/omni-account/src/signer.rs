//! Unified signer abstraction for different signing backends.
//!
//! This module provides the `AccountSigner` enum which allows owner schemes
//! to work with any key backend without knowing the underlying implementation.

use alloy_primitives::{Address, Signature, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;

/// Unified signer that wraps different signing backends.
#[derive(Clone)]
pub enum AccountSigner {
	/// Local signer using a private key stored in memory.
	Local(PrivateKeySigner),
}

impl AccountSigner {
	/// Returns the signer's Ethereum address.
	pub fn address(&self) -> Address {
		match self {
			Self::Local(s) => Signer::address(s),
		}
	}

	/// Signs the given hash without any message prefix.
	pub async fn sign_hash(&self, hash: &B256) -> alloy_signer::Result<Signature> {
		match self {
			Self::Local(s) => s.sign_hash(hash).await,
		}
	}
}

impl std::fmt::Debug for AccountSigner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Local(_) => f
				.debug_struct("AccountSigner::Local")
				.field("address", &self.address())
				.finish_non_exhaustive(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_PRIVATE_KEY: &str =
		"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn create_test_signer() -> AccountSigner {
		let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
		AccountSigner::Local(signer)
	}

	#[test]
	fn test_account_signer_address() {
		let signer = create_test_signer();
		let address = signer.address();
		// Anvil account #0 address (lowercase)
		assert_eq!(
			format!("{:?}", address).to_lowercase(),
			"0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
		);
	}

	#[tokio::test]
	async fn test_account_signer_sign_hash_recovers() {
		let signer = create_test_signer();
		let hash = B256::repeat_byte(0x42);
		let signature = signer.sign_hash(&hash).await.unwrap();
		assert_eq!(signature.recover_address_from_prehash(&hash).unwrap(), signer.address());
	}

	#[test]
	fn test_account_signer_debug() {
		let signer = create_test_signer();
		let debug_str = format!("{:?}", signer);
		assert!(debug_str.contains("AccountSigner::Local"));
		assert!(!debug_str.contains("ac0974"));
	}
}

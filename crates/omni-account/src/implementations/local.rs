//! Local private key wallet.
//!
//! Keys are parsed with Alloy's `PrivateKeySigner` and kept in memory. Suitable
//! for owner keys and session keys loaded from configuration.

use crate::{AccountError, AccountSigner};
use alloy_signer_local::PrivateKeySigner;
use omni_types::without_0x_prefix;

/// Local wallet implementation using Alloy's signer.
#[derive(Debug)]
pub struct LocalWallet {
	/// The underlying Alloy signer that handles cryptographic operations.
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a new LocalWallet from a hex-encoded private key.
	///
	/// The private key should be provided as a hex string (with or without 0x prefix).
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		let key = without_0x_prefix(private_key_hex);
		if key.len() != 64 {
			return Err(AccountError::InvalidKey(
				"Private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}

		let signer = key
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer })
	}

	/// Returns a unified signer for use by owner schemes.
	pub fn signer(&self) -> AccountSigner {
		AccountSigner::Local(self.signer.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{Signature, B256};
	use alloy_signer::Signer;

	// Test private key (FOR TESTING ONLY!)
	const TEST_PRIVATE_KEY: &str =
		"ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const TEST_PRIVATE_KEY_WITH_PREFIX: &str =
		"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const INVALID_PRIVATE_KEY: &str = "invalid_key";
	const SHORT_PRIVATE_KEY: &str = "1234";

	#[test]
	fn test_local_wallet_new_valid_key() {
		let wallet = LocalWallet::new(TEST_PRIVATE_KEY).unwrap();
		assert!(wallet.signer.to_bytes().len() == 32);

		let prefixed = LocalWallet::new(TEST_PRIVATE_KEY_WITH_PREFIX).unwrap();
		assert_eq!(wallet.signer.address(), prefixed.signer.address());

		let upper = LocalWallet::new(&TEST_PRIVATE_KEY_WITH_PREFIX.replacen("0x", "0X", 1)).unwrap();
		assert_eq!(wallet.signer.address(), upper.signer.address());
	}

	#[test]
	fn test_local_wallet_new_invalid_key() {
		let result = LocalWallet::new(INVALID_PRIVATE_KEY);
		assert!(matches!(result.unwrap_err(), AccountError::InvalidKey(_)));

		let result = LocalWallet::new(SHORT_PRIVATE_KEY);
		assert!(matches!(result.unwrap_err(), AccountError::InvalidKey(_)));
	}

	#[tokio::test]
	async fn test_signer_signs_raw_65_bytes() {
		let wallet = LocalWallet::new(TEST_PRIVATE_KEY).unwrap();
		let signer = wallet.signer();
		let hash = B256::repeat_byte(0x24);

		let signature = signer.sign_hash(&hash).await.unwrap();
		assert_eq!(signature.as_bytes().len(), 65);

		let parsed = Signature::from_raw(&signature.as_bytes()).unwrap();
		assert_eq!(parsed.recover_address_from_prehash(&hash).unwrap(), wallet.signer.address());
		assert_eq!(signer.address(), wallet.signer.address());
	}
}

//! Account signing module for omnichain smart accounts.
//!
//! This module provides the signing backends used to authorize user operations
//! and order bundles. Owner authentication schemes (single key, threshold
//! multi-key, passkey) are modelled as a tagged variant with a uniform
//! `produce_signature` capability.

use alloy_primitives::Address;
use omni_types::SecretString;
use thiserror::Error;

/// Owner scheme dispatch and signature sets.
pub mod owners;
/// Signer abstraction module
pub mod signer;

pub use owners::{
	interfaces::WebAuthnAuth, OwnerSignature, OwnerSigner, PasskeyAssertion, PasskeySigner,
};
pub use signer::AccountSigner;

#[cfg(feature = "testing")]
pub use owners::MockPasskeySigner;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// A signature recovered to an address that is not a configured owner.
	#[error("Signer {0} is not an owner of this account")]
	UnknownOwner(Address),
	/// The owner configuration cannot produce signatures.
	#[error("Invalid owner configuration: {0}")]
	InvalidOwners(String),
}

/// Builds a local signer from a hex private key held in a secret.
pub fn signer_from_secret(private_key: &SecretString) -> Result<AccountSigner, AccountError> {
	let wallet = private_key.with_exposed(implementations::local::LocalWallet::new)?;
	Ok(wallet.signer())
}

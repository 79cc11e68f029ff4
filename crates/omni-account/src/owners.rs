//! Owner authentication schemes.
//!
//! `OwnerSigner` is dispatched by scheme tag. ECDSA owner sets produce a
//! signature set keyed by owner address so it can be completed by co-signers
//! and always encodes in ascending address order. Passkey owners delegate to
//! an external WebAuthn authenticator.

use crate::{AccountError, AccountSigner};
use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use omni_types::{standards::erc4337::DUMMY_ECDSA_SIGNATURE, ContractAddresses, OwnerConfig};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

// WebAuthn validator ABI
pub mod interfaces {
	use alloy_sol_types::sol;

	sol! {
		#[derive(Debug, PartialEq, Eq)]
		struct WebAuthnAuth {
			bytes authenticatorData;
			string clientDataJSON;
			uint256 challengeIndex;
			uint256 typeIndex;
			uint256 r;
			uint256 s;
		}
	}
}

use interfaces::WebAuthnAuth;

/// A WebAuthn assertion over a challenge, with the credential that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasskeyAssertion {
	pub credential_id: B256,
	pub auth: WebAuthnAuth,
}

/// External WebAuthn authenticator (browser, hardware key, remote signer).
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasskeySigner: Send + Sync {
	/// Requests an assertion with `challenge` as the WebAuthn challenge.
	async fn sign(&self, challenge: B256) -> Result<PasskeyAssertion, AccountError>;
}

/// Signing capability of the account owners.
#[derive(Clone)]
pub enum OwnerSigner {
	/// ECDSA owners with a threshold. `signers` holds the keys available locally.
	Ecdsa { owners: Vec<Address>, threshold: usize, signers: Vec<AccountSigner> },
	/// WebAuthn credentials backed by an external authenticator.
	Passkey { credential_ids: Vec<B256>, authenticator: Arc<dyn PasskeySigner> },
}

impl std::fmt::Debug for OwnerSigner {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Ecdsa { owners, threshold, signers } => f
				.debug_struct("OwnerSigner::Ecdsa")
				.field("owners", owners)
				.field("threshold", threshold)
				.field("local_signers", &signers.len())
				.finish(),
			Self::Passkey { credential_ids, .. } => f
				.debug_struct("OwnerSigner::Passkey")
				.field("credential_ids", credential_ids)
				.finish_non_exhaustive(),
		}
	}
}

impl OwnerSigner {
	/// Binds an owner configuration to the key material available locally.
	///
	/// Every local ECDSA signer must be one of the configured owners.
	pub fn from_config(
		config: &OwnerConfig,
		signers: Vec<AccountSigner>,
		authenticator: Option<Arc<dyn PasskeySigner>>,
	) -> Result<Self, AccountError> {
		match config {
			OwnerConfig::Ecdsa { owners, threshold } => {
				if *threshold == 0 || *threshold > owners.len() {
					return Err(AccountError::InvalidOwners(format!(
						"threshold {} with {} owners",
						threshold,
						owners.len()
					)));
				}
				if let Some(stranger) =
					signers.iter().map(AccountSigner::address).find(|a| !owners.contains(a))
				{
					return Err(AccountError::UnknownOwner(stranger));
				}
				Ok(Self::Ecdsa { owners: owners.clone(), threshold: *threshold, signers })
			},
			OwnerConfig::Passkey { credential_ids, .. } => {
				let authenticator = authenticator.ok_or_else(|| {
					AccountError::InvalidOwners("passkey owners need an authenticator".into())
				})?;
				Ok(Self::Passkey { credential_ids: credential_ids.clone(), authenticator })
			},
		}
	}

	/// Validator module that verifies these owners.
	pub fn validator(&self, contracts: &ContractAddresses) -> Address {
		match self {
			Self::Ecdsa { .. } => contracts.ownable_validator,
			Self::Passkey { .. } => contracts.webauthn_validator,
		}
	}

	/// Signs `hash` with up to `threshold` local owner keys, lowest address first.
	///
	/// For threshold sets the result may be incomplete; callers inspect
	/// [`OwnerSignature::is_complete`] before submitting.
	pub async fn produce_signature(&self, hash: &B256) -> Result<OwnerSignature, AccountError> {
		match self {
			Self::Ecdsa { threshold, signers, .. } => {
				let mut selected: Vec<&AccountSigner> = signers.iter().collect();
				selected.sort_by_key(|s| s.address());
				selected.dedup_by_key(|s| s.address());

				let mut signatures = BTreeMap::new();
				for signer in selected.into_iter().take(*threshold) {
					let signature = signer.sign_hash(hash).await.map_err(|e| {
						AccountError::SigningFailed(format!("owner {}: {}", signer.address(), e))
					})?;
					signatures.insert(signer.address(), Bytes::from(signature.as_bytes().to_vec()));
				}
				debug!(
					collected = signatures.len(),
					threshold = threshold,
					"Collected owner signatures"
				);
				Ok(OwnerSignature::Ecdsa { threshold: *threshold, signatures })
			},
			Self::Passkey { authenticator, .. } => {
				let assertion = authenticator.sign(*hash).await?;
				Ok(OwnerSignature::Passkey { payload: encode_webauthn(vec![assertion]) })
			},
		}
	}

	/// Placeholder signature with the final length, for gas estimation.
	pub fn dummy_signature(&self) -> Bytes {
		match self {
			Self::Ecdsa { threshold, .. } => DUMMY_ECDSA_SIGNATURE.repeat(*threshold).into(),
			Self::Passkey { credential_ids, .. } => {
				let credential_id = credential_ids.first().copied().unwrap_or_default();
				encode_webauthn(vec![PasskeyAssertion {
					credential_id,
					auth: WebAuthnAuth {
						authenticatorData: Bytes::from(vec![0x49; 37]),
						clientDataJSON: format!(
							"{{\"type\":\"webauthn.get\",\"challenge\":\"{}\",\"origin\":\"https://localhost\"}}",
							"A".repeat(43)
						),
						challengeIndex: U256::from(23),
						typeIndex: U256::from(1),
						r: U256::MAX,
						s: U256::MAX >> 1,
					},
				}])
			},
		}
	}
}

/// `abi.encode(bytes32[] credentialIds, bool usePrecompile, WebAuthnAuth[] signatures)`.
fn encode_webauthn(assertions: Vec<PasskeyAssertion>) -> Bytes {
	let (credential_ids, auths): (Vec<B256>, Vec<WebAuthnAuth>) =
		assertions.into_iter().map(|a| (a.credential_id, a.auth)).unzip();
	(credential_ids, false, auths).abi_encode_params().into()
}

/// Signature material produced by the owners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OwnerSignature {
	/// ECDSA signatures keyed (and therefore ordered) by owner address.
	Ecdsa { threshold: usize, signatures: BTreeMap<Address, Bytes> },
	/// Encoded WebAuthn payload.
	Passkey { payload: Bytes },
}

impl OwnerSignature {
	/// True once enough signatures are present to satisfy the threshold.
	pub fn is_complete(&self) -> bool {
		match self {
			Self::Ecdsa { threshold, signatures } => signatures.len() >= *threshold,
			Self::Passkey { payload } => !payload.is_empty(),
		}
	}

	/// Number of signatures collected so far.
	pub fn collected(&self) -> usize {
		match self {
			Self::Ecdsa { signatures, .. } => signatures.len(),
			Self::Passkey { .. } => 1,
		}
	}

	/// Concatenation in ascending owner order, as the validator expects.
	///
	/// At most `threshold` signatures are encoded so the length matches
	/// [`OwnerSigner::dummy_signature`].
	pub fn encode(&self) -> Bytes {
		match self {
			Self::Ecdsa { threshold, signatures } => signatures
				.values()
				.take(*threshold)
				.flat_map(|s| s.iter().copied())
				.collect::<Vec<u8>>()
				.into(),
			Self::Passkey { payload } => payload.clone(),
		}
	}

	/// Adds a co-signer's signature after checking it recovers to an owner.
	pub fn insert_verified(
		&mut self,
		owners: &[Address],
		hash: &B256,
		signature: Bytes,
	) -> Result<Address, AccountError> {
		let Self::Ecdsa { signatures, .. } = self else {
			return Err(AccountError::InvalidOwners(
				"co-signing is only supported for ECDSA owners".into(),
			));
		};

		let parsed = Signature::from_raw(&signature)
			.map_err(|e| AccountError::SigningFailed(format!("Malformed signature: {}", e)))?;
		let signer = parsed
			.recover_address_from_prehash(hash)
			.map_err(|e| AccountError::SigningFailed(format!("Unrecoverable signature: {}", e)))?;
		if !owners.contains(&signer) {
			return Err(AccountError::UnknownOwner(signer));
		}

		signatures.insert(signer, Bytes::from(parsed.as_bytes().to_vec()));
		Ok(signer)
	}
}

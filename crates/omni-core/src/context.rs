//! Scoped handles shared by the session manager and the pipeline.
//!
//! One context is built per account configuration. It owns the chain and
//! orchestrator clients and the local key material; nothing here is global.

use crate::{polling::RetryPolicy, CoreError};
use alloy_primitives::{Address, Bytes, B256};
use omni_account::{AccountSigner, OwnerSigner};
use omni_delivery::DeliveryService;
use omni_orchestrator::OrchestratorInterface;
use omni_types::{AccountConfig, Session};
use std::sync::Arc;

/// Everything a pipeline stage may need, built once per account.
pub struct AccountContext {
	pub config: AccountConfig,
	pub delivery: DeliveryService,
	pub orchestrator: Arc<dyn OrchestratorInterface>,
	pub owners: OwnerSigner,
	/// Local keys that may act as session owners.
	pub session_signers: Vec<AccountSigner>,
	pub retry: RetryPolicy,
}

impl AccountContext {
	pub fn new(
		config: AccountConfig,
		delivery: DeliveryService,
		orchestrator: Arc<dyn OrchestratorInterface>,
		owners: OwnerSigner,
		session_signers: Vec<AccountSigner>,
		retry: RetryPolicy,
	) -> Self {
		Self {
			config,
			delivery,
			orchestrator,
			owners,
			session_signers,
			retry,
		}
	}

	pub fn address(&self) -> Address {
		self.config.address
	}

	/// Fails fast when a chain has no reader or bundler configured.
	pub fn ensure_chain(&self, chain_id: u64) -> Result<(), CoreError> {
		if self.delivery.supports_chain(chain_id) {
			Ok(())
		} else {
			Err(CoreError::UnsupportedChain(chain_id))
		}
	}

	/// Local signers for `session`, ascending by address, exactly `threshold` of them.
	pub fn session_signers_for(&self, session: &Session) -> Result<Vec<&AccountSigner>, CoreError> {
		let threshold = usize::try_from(session.owners.threshold).unwrap_or(usize::MAX);
		let mut signers: Vec<&AccountSigner> = self
			.session_signers
			.iter()
			.filter(|signer| session.owners.accounts.contains(&signer.address()))
			.collect();
		signers.sort_by_key(|signer| signer.address());
		signers.dedup_by_key(|signer| signer.address());

		if threshold == 0 || signers.len() < threshold {
			return Err(CoreError::MissingSessionSigner(session.permission_id()));
		}
		signers.truncate(threshold);
		Ok(signers)
	}

	/// Signs `hash` with the session's local owners, concatenated ascending.
	pub async fn sign_as_session(&self, session: &Session, hash: &B256) -> Result<Bytes, CoreError> {
		let mut out = Vec::new();
		for signer in self.session_signers_for(session)? {
			let signature = signer.sign_hash(hash).await.map_err(|e| {
				omni_account::AccountError::SigningFailed(format!(
					"session signer {}: {}",
					signer.address(),
					e
				))
			})?;
			out.extend_from_slice(&signature.as_bytes());
		}
		Ok(out.into())
	}
}

impl std::fmt::Debug for AccountContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccountContext")
			.field("address", &self.config.address)
			.field("kind", &self.config.kind)
			.field("owners", &self.owners)
			.field("session_signers", &self.session_signers.len())
			.field("retry", &self.retry)
			.finish_non_exhaustive()
	}
}

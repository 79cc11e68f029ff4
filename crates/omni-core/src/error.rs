//! Error taxonomy of the account core.
//!
//! Every failure is returned to the caller. The class returned by
//! [`CoreError::kind`] tells whether the failure happened before any network
//! call, upstream, while waiting, or on chain.

use alloy_primitives::{Bytes, B256, U256};
use omni_account::AccountError;
use omni_delivery::DeliveryError;
use omni_orchestrator::OrchestratorError;
use omni_types::{BundleStatus, EncodingError};
use thiserror::Error;

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Detected locally before any network call.
	Configuration,
	/// Deterministic hashing or packing failure.
	Encoding,
	/// A bundler, node or orchestrator refused or failed the request.
	Remote,
	/// The polling budget ran out; the operation may still land.
	Liveness,
	/// The session could not be installed.
	SessionInstallation,
	/// Signatures could not be produced or are not yet sufficient.
	Signing,
	/// The operation reached a definitive failed state.
	Execution,
}

/// Errors that can occur in the session manager and the transaction pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Configuration(String),
	#[error("Chain {0} is not configured")]
	UnsupportedChain(u64),
	/// Submission was requested for an artifact that never went through signing.
	#[error("Transaction has not been signed")]
	NotSigned,
	#[error("No signer available for session {0}")]
	MissingSessionSigner(B256),
	#[error("Encoding error: {0}")]
	Encoding(#[from] EncodingError),
	#[error("Delivery error: {0}")]
	Delivery(DeliveryError),
	#[error("Orchestrator error: {0}")]
	Orchestrator(#[from] OrchestratorError),
	#[error("Timed out waiting for {what} after {attempts} attempts")]
	Timeout { what: String, attempts: u32 },
	#[error("Session installation failed: {0}")]
	SessionInstallation(String),
	#[error("Incomplete signatures: {collected} of {required} collected")]
	IncompleteSignatures { collected: usize, required: usize },
	#[error("Signing error: {0}")]
	Signing(#[from] AccountError),
	#[error("User operation {hash} reverted")]
	OperationReverted { hash: B256, reason: Option<Bytes> },
	#[error("Bundle {id} ended with status {status}")]
	BundleFailed { id: U256, status: BundleStatus },
}

impl From<DeliveryError> for CoreError {
	fn from(err: DeliveryError) -> Self {
		match err {
			DeliveryError::NoImplementationAvailable(chain_id) => {
				CoreError::UnsupportedChain(chain_id)
			},
			DeliveryError::Encoding(e) => CoreError::Encoding(e),
			other => CoreError::Delivery(other),
		}
	}
}

impl CoreError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			CoreError::Configuration(_)
			| CoreError::UnsupportedChain(_)
			| CoreError::NotSigned
			| CoreError::MissingSessionSigner(_) => ErrorKind::Configuration,
			CoreError::Encoding(_) => ErrorKind::Encoding,
			CoreError::Delivery(_) | CoreError::Orchestrator(_) => ErrorKind::Remote,
			CoreError::Timeout { .. } => ErrorKind::Liveness,
			CoreError::SessionInstallation(_) => ErrorKind::SessionInstallation,
			CoreError::IncompleteSignatures { .. } | CoreError::Signing(_) => ErrorKind::Signing,
			CoreError::OperationReverted { .. } | CoreError::BundleFailed { .. } => {
				ErrorKind::Execution
			},
		}
	}

	/// True for failures that polling may retry.
	pub fn is_transient(&self) -> bool {
		match self {
			CoreError::Delivery(e) => e.is_transient(),
			CoreError::Orchestrator(e) => e.is_transient(),
			_ => false,
		}
	}
}

//! Orchestrator client module for omnichain smart accounts.
//!
//! The orchestrator matches cross-chain intents with liquidity. The client
//! asks it for an order path, posts the signed canonical bundle and polls the
//! bundle status.

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use omni_types::{BundleResult, BundleSubmission, MetaIntent, OrderPath, SignedOrderBundle};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

pub use implementations::http::HttpOrchestrator;

/// Errors that can occur while talking to the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
	/// The request never produced an HTTP response.
	#[error("HTTP error: {0}")]
	Http(String),
	/// The orchestrator answered with a non-success status.
	#[error("Orchestrator rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
	/// The response body did not match the expected shape.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
}

impl OrchestratorError {
	/// True for failures that may succeed on retry.
	pub fn is_transient(&self) -> bool {
		match self {
			OrchestratorError::Http(_) => true,
			OrchestratorError::Rejected { status, .. } => *status >= 500 || *status == 429,
			OrchestratorError::InvalidResponse(_) => false,
		}
	}
}

/// Trait defining the orchestrator service contract.
#[async_trait]
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait OrchestratorInterface: Send + Sync {
	/// Requests candidate order bundles that fulfil `intent` for `account`.
	async fn get_order_path(
		&self,
		intent: &MetaIntent,
		account: Address,
	) -> Result<OrderPath, OrchestratorError>;

	/// Posts a signed bundle and returns its identifier.
	async fn post_signed_order_bundle(
		&self,
		bundle: &SignedOrderBundle,
	) -> Result<BundleSubmission, OrchestratorError>;

	/// Returns the current status of a bundle.
	async fn get_bundle_status(&self, bundle_id: U256) -> Result<BundleResult, OrchestratorError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transient_classification() {
		assert!(OrchestratorError::Http("connection reset".into()).is_transient());
		assert!(OrchestratorError::Rejected { status: 503, message: String::new() }.is_transient());
		assert!(!OrchestratorError::Rejected { status: 400, message: String::new() }.is_transient());
		assert!(!OrchestratorError::InvalidResponse("bad json".into()).is_transient());
	}
}

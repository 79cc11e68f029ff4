//! Orchestrator request and response payloads.

use crate::standards::compact::{Execution, MultiChainCompact};
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// A token amount the intent must deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
	pub token_address: Address,
	pub amount: U256,
}

/// Chains and tokens the orchestrator may draw funds from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAccess {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub chain_ids: Vec<u64>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tokens: Vec<Address>,
}

/// What the caller wants to happen on the target chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaIntent {
	pub target_chain_id: u64,
	pub token_transfers: Vec<TokenTransfer>,
	pub target_account: Address,
	pub target_executions: Vec<Execution>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub account_access: Option<AccountAccess>,
}

/// One candidate bundle plus the executions the orchestrator adds to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPathEntry {
	pub order_bundle: MultiChainCompact,
	#[serde(default)]
	pub injected_executions: Vec<Execution>,
}

/// Ordered candidates; the first entry's bundle is canonical.
pub type OrderPath = Vec<OrderPathEntry>;

/// A bundle with the sponsor signatures attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrderBundle {
	#[serde(flatten)]
	pub bundle: MultiChainCompact,
	/// One signature per segment, in segment order.
	pub origin_signatures: Vec<Bytes>,
	pub target_signature: Bytes,
}

/// Response to a bundle submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSubmission {
	pub bundle_id: U256,
	#[serde(default)]
	pub status: Option<BundleStatus>,
}

/// Lifecycle of a bundle on the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleStatus {
	Pending,
	Preconfirmed,
	Filled,
	Expired,
	Failed,
}

impl BundleStatus {
	/// Filled, expired and failed bundles never change again.
	pub fn is_terminal(&self) -> bool {
		matches!(self, BundleStatus::Filled | BundleStatus::Expired | BundleStatus::Failed)
	}
}

impl std::fmt::Display for BundleStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			BundleStatus::Pending => "PENDING",
			BundleStatus::Preconfirmed => "PRECONFIRMED",
			BundleStatus::Filled => "FILLED",
			BundleStatus::Expired => "EXPIRED",
			BundleStatus::Failed => "FAILED",
		};
		write!(f, "{}", s)
	}
}

/// A claim settled on a source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleClaim {
	pub chain_id: u64,
	#[serde(default)]
	pub claim_transaction_hash: Option<B256>,
	pub status: BundleStatus,
}

/// Status report of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleResult {
	pub id: U256,
	pub status: BundleStatus,
	#[serde(default)]
	pub fill_transaction_hash: Option<B256>,
	#[serde(default)]
	pub fill_timestamp: Option<u64>,
	#[serde(default)]
	pub claims: Vec<BundleClaim>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::utils::tests::builders::MultiChainCompactBuilder;

	#[test]
	fn test_bundle_status_wire_format() {
		let status: BundleStatus = serde_json::from_str("\"PRECONFIRMED\"").unwrap();
		assert_eq!(status, BundleStatus::Preconfirmed);
		assert!(!status.is_terminal());
		assert!(BundleStatus::Expired.is_terminal());
		assert_eq!(BundleStatus::Failed.to_string(), "FAILED");
	}

	#[test]
	fn test_signed_bundle_flattens_compact() {
		let signed = SignedOrderBundle {
			bundle: MultiChainCompactBuilder::new().with_segment(10).build(),
			origin_signatures: vec![Bytes::from_static(&[0x01])],
			target_signature: Bytes::from_static(&[0x01]),
		};
		let json = serde_json::to_value(&signed).unwrap();

		assert!(json["sponsor"].is_string());
		assert!(json["segments"].is_array());
		assert_eq!(json["originSignatures"][0], "0x01");
	}
}

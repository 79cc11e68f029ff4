//! Delivery types for bundler and chain interactions.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Inclusion details of the transaction that carried a user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionReceipt {
	pub transaction_hash: B256,
	pub block_number: U64,
}

/// Result of `eth_getUserOperationReceipt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
	pub user_op_hash: B256,
	pub sender: Address,
	pub nonce: U256,
	pub success: bool,
	pub actual_gas_cost: U256,
	pub actual_gas_used: U256,
	/// Revert data when `success` is false.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<Bytes>,
	pub receipt: InclusionReceipt,
}

/// EIP-1559 fee estimate of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasFees {
	pub max_fee_per_gas: U256,
	pub max_priority_fee_per_gas: U256,
}

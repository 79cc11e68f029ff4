//! Logical transactions as requested by callers.

use crate::session::Session;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A call the account should perform on the target chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
	pub to: Address,
	#[serde(default)]
	pub value: U256,
	#[serde(default)]
	pub data: Bytes,
}

/// Tokens that must be available on the target chain before the calls run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
	pub address: Address,
	pub amount: U256,
}

/// Caller-facing description of one logical transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_chain: Option<u64>,
	pub target_chain: u64,
	pub calls: Vec<Call>,
	#[serde(default)]
	pub token_requests: Vec<TokenRequest>,
	/// Session to sign with instead of the account owners.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session: Option<Session>,
}

impl Transaction {
	/// True when the transaction can run as one user operation on the target chain.
	pub fn is_direct(&self) -> bool {
		let same_chain = self.source_chain.is_none_or(|source| source == self.target_chain);
		same_chain && self.token_requests.is_empty()
	}
}

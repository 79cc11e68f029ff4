//! Builder for UserOperationReceipt
//!
//! Provides a fluent API for constructing bundler receipts in tests.

use crate::delivery::{InclusionReceipt, UserOperationReceipt};
use alloy_primitives::{Address, Bytes, B256, U256, U64};

/// Builder for creating `UserOperationReceipt` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct UserOperationReceiptBuilder {
	user_op_hash: B256,
	sender: Address,
	success: bool,
	reason: Option<Bytes>,
	transaction_hash: B256,
	block_number: u64,
}

impl Default for UserOperationReceiptBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl UserOperationReceiptBuilder {
	/// Creates a new builder for a successful receipt.
	pub fn new() -> Self {
		Self {
			user_op_hash: B256::ZERO,
			sender: Address::ZERO,
			success: true,
			reason: None,
			transaction_hash: B256::repeat_byte(0x77),
			block_number: 1,
		}
	}

	pub fn with_user_op_hash(mut self, hash: B256) -> Self {
		self.user_op_hash = hash;
		self
	}

	pub fn with_sender(mut self, sender: Address) -> Self {
		self.sender = sender;
		self
	}

	/// Marks the operation as reverted with the given reason.
	pub fn reverted(mut self, reason: Bytes) -> Self {
		self.success = false;
		self.reason = Some(reason);
		self
	}

	pub fn with_block_number(mut self, block_number: u64) -> Self {
		self.block_number = block_number;
		self
	}

	pub fn build(self) -> UserOperationReceipt {
		UserOperationReceipt {
			user_op_hash: self.user_op_hash,
			sender: self.sender,
			nonce: U256::ZERO,
			success: self.success,
			actual_gas_cost: U256::from(21_000),
			actual_gas_used: U256::from(21_000),
			reason: self.reason,
			receipt: InclusionReceipt {
				transaction_hash: self.transaction_hash,
				block_number: U64::from(self.block_number),
			},
		}
	}
}

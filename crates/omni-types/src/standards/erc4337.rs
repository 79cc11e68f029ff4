//! ERC-4337 v0.7 user operations.

use crate::{utils::constants::ENTRY_POINT_ADDRESS, EncodingError};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

/// EntryPoint v0.7 address.
pub const ENTRY_POINT_V07: Address = ENTRY_POINT_ADDRESS;

/// Placeholder ECDSA signature used for gas estimation.
pub const DUMMY_ECDSA_SIGNATURE: [u8; 65] = {
	let mut sig = [0xaa; 65];
	let mut i = 0;
	while i < 32 {
		sig[i] = 0xff;
		i += 1;
	}
	sig[64] = 0x1c;
	sig
};

/// A user operation with its gas fields kept unpacked.
///
/// The packed `accountGasLimits` and `gasFees` words are derived when hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedUserOperation {
	pub sender: Address,
	pub nonce: U256,
	pub init_code: Bytes,
	pub call_data: Bytes,
	pub call_gas_limit: U256,
	pub verification_gas_limit: U256,
	pub pre_verification_gas: U256,
	pub max_fee_per_gas: U256,
	pub max_priority_fee_per_gas: U256,
	pub paymaster_and_data: Bytes,
	pub signature: Bytes,
}

impl PackedUserOperation {
	/// `verificationGasLimit << 128 | callGasLimit`.
	pub fn account_gas_limits(&self) -> Result<B256, EncodingError> {
		pack_u128_pair(
			("verificationGasLimit", self.verification_gas_limit),
			("callGasLimit", self.call_gas_limit),
		)
	}

	/// `maxPriorityFeePerGas << 128 | maxFeePerGas`.
	pub fn gas_fees(&self) -> Result<B256, EncodingError> {
		pack_u128_pair(
			("maxPriorityFeePerGas", self.max_priority_fee_per_gas),
			("maxFeePerGas", self.max_fee_per_gas),
		)
	}

	/// Splits `initCode` into factory address and factory data.
	pub fn factory(&self) -> Option<(Address, Bytes)> {
		if self.init_code.len() < 20 {
			return None;
		}
		Some((
			Address::from_slice(&self.init_code[..20]),
			Bytes::copy_from_slice(&self.init_code[20..]),
		))
	}

	/// Hash the account validates: binds the operation to entry point and chain.
	///
	/// Fails if a packed gas field does not fit in 128 bits.
	pub fn hash(&self, entry_point: &Address, chain_id: U256) -> Result<B256, EncodingError> {
		let packed = (
			self.sender,
			self.nonce,
			keccak256(&self.init_code),
			keccak256(&self.call_data),
			self.account_gas_limits()?,
			self.pre_verification_gas,
			self.gas_fees()?,
			keccak256(&self.paymaster_and_data),
		)
			.abi_encode_params();
		Ok(keccak256((keccak256(packed), *entry_point, chain_id).abi_encode_params()))
	}
}

fn pack_u128_pair(high: (&str, U256), low: (&str, U256)) -> Result<B256, EncodingError> {
	let narrow = |(field, value): (&str, U256)| {
		u128::try_from(value).map_err(|_| EncodingError::GasFieldOverflow {
			field: field.to_string(),
			value: value.to_string(),
		})
	};

	let mut word = [0u8; 32];
	word[..16].copy_from_slice(&narrow(high)?.to_be_bytes());
	word[16..].copy_from_slice(&narrow(low)?.to_be_bytes());
	Ok(B256::from(word))
}

/// Gas limits returned by `eth_estimateUserOperationGas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimate {
	pub pre_verification_gas: U256,
	pub verification_gas_limit: U256,
	pub call_gas_limit: U256,
}

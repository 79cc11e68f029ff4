//! ERC-7579 execution encoding and the contract interfaces the client calls.

use crate::{error::EncodingError, transaction::Call};
use alloy_primitives::{Bytes, B256};
use alloy_sol_types::{SolCall, SolValue};

/// Execution mode for a single call (call type 0x00, default exec type).
pub const MODE_SINGLE: B256 = B256::ZERO;
/// Execution mode for a batch of calls (call type 0x01).
pub const MODE_BATCH: B256 = {
	let mut mode = [0u8; 32];
	mode[0] = 0x01;
	B256::new(mode)
};

// Solidity definitions for ABI encoding against account contracts and modules
#[allow(clippy::too_many_arguments)]
pub mod interfaces {
	use alloy_sol_types::sol;

	sol! {
		/// ERC-7579 batch entry.
		#[derive(Debug, PartialEq, Eq)]
		struct Execution {
			address target;
			uint256 value;
			bytes callData;
		}

		/// ERC-7579 account execution entry point.
		interface IERC7579Account {
			function execute(bytes32 mode, bytes calldata executionCalldata) external payable;
		}

		/// EntryPoint v0.7 nonce lookup.
		interface IEntryPoint {
			function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
		}

		/// ERC-5267 domain retrieval.
		interface IERC5267 {
			function eip712Domain() external view returns (
				bytes1 fields,
				string name,
				string version,
				uint256 chainId,
				address verifyingContract,
				bytes32 salt,
				uint256[] extensions
			);
		}
	}
}

/// Encodes `execute(mode, executionCalldata)` for the given calls.
///
/// One call is packed as `target ‖ value ‖ callData`; several are ABI-encoded
/// as `Execution[]` under the batch mode.
pub fn encode_execute(calls: &[Call]) -> Result<Bytes, EncodingError> {
	let (mode, execution_calldata) = match calls {
		[] => return Err(EncodingError::EmptyExecution),
		[call] => {
			let mut packed = Vec::with_capacity(20 + 32 + call.data.len());
			packed.extend_from_slice(call.to.as_slice());
			packed.extend_from_slice(&call.value.to_be_bytes::<32>());
			packed.extend_from_slice(&call.data);
			(MODE_SINGLE, packed)
		},
		calls => {
			let executions: Vec<interfaces::Execution> = calls
				.iter()
				.map(|call| interfaces::Execution {
					target: call.to,
					value: call.value,
					callData: call.data.clone(),
				})
				.collect();
			(MODE_BATCH, executions.abi_encode())
		},
	};

	Ok(interfaces::IERC7579Account::executeCall {
		mode,
		executionCalldata: execution_calldata.into(),
	}
	.abi_encode()
	.into())
}

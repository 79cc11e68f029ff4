//! Delivery module for omnichain smart accounts.
//!
//! This module defines the two chain-facing collaborators of the account
//! stack: a [`ChainReader`] for contract state and fee data, and a
//! [`BundlerInterface`] for ERC-4337 user operations. The [`DeliveryService`]
//! routes every request to the implementation registered for its chain and
//! offers typed helpers for the contract reads the pipeline depends on.

use alloy_primitives::{aliases::U192, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use omni_types::{
	session::interfaces::ISmartSession,
	standards::erc7579::interfaces::{IERC5267, IEntryPoint},
	AccountDomain, EncodingError, GasFees, PackedUserOperation, UserOperationGasEstimate,
	UserOperationReceipt,
};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod bundler {
		pub mod rpc;
	}
}

/// Errors that can occur during chain reads and user operation delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The bundler or node refused the request; carries the upstream reason.
	#[error("Rejected by upstream: {0}")]
	Rejected(String),
	/// A response could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// A decoded response violates a structural rule of the encoding layer.
	#[error(transparent)]
	Encoding(#[from] EncodingError),
	/// No implementation is registered for the chain.
	#[error("No implementation available for chain {0}")]
	NoImplementationAvailable(u64),
}

impl DeliveryError {
	/// True for failures that may succeed on retry.
	pub fn is_transient(&self) -> bool {
		matches!(self, DeliveryError::Network(_))
	}
}

/// Read access to chain state.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ChainReader: Send + Sync {
	/// Executes an `eth_call` against `to` with the given calldata.
	async fn call(&self, chain_id: u64, to: Address, data: Bytes) -> Result<Bytes, DeliveryError>;

	/// Returns the deployed code at `address`.
	async fn get_code(&self, chain_id: u64, address: Address) -> Result<Bytes, DeliveryError>;

	/// Returns the current EIP-1559 fee estimate.
	async fn estimate_fees(&self, chain_id: u64) -> Result<GasFees, DeliveryError>;
}

/// ERC-4337 bundler access.
#[async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait BundlerInterface: Send + Sync {
	/// `eth_estimateUserOperationGas`.
	async fn estimate_user_operation_gas(
		&self,
		chain_id: u64,
		user_op: &PackedUserOperation,
		entry_point: Address,
	) -> Result<UserOperationGasEstimate, DeliveryError>;

	/// `eth_sendUserOperation`, returning the user operation hash.
	async fn send_user_operation(
		&self,
		chain_id: u64,
		user_op: &PackedUserOperation,
		entry_point: Address,
	) -> Result<B256, DeliveryError>;

	/// `eth_getUserOperationReceipt`; `None` while the operation is pending.
	async fn get_user_operation_receipt(
		&self,
		chain_id: u64,
		hash: B256,
	) -> Result<Option<UserOperationReceipt>, DeliveryError>;
}

/// Service that routes chain reads and bundler calls by chain id.
///
/// Handles are constructed once per account configuration and passed to every
/// pipeline stage.
#[derive(Clone)]
pub struct DeliveryService {
	readers: HashMap<u64, Arc<dyn ChainReader>>,
	bundlers: HashMap<u64, Arc<dyn BundlerInterface>>,
}

impl DeliveryService {
	/// Creates a new DeliveryService from per-chain implementations.
	pub fn new(
		readers: HashMap<u64, Arc<dyn ChainReader>>,
		bundlers: HashMap<u64, Arc<dyn BundlerInterface>>,
	) -> Self {
		Self { readers, bundlers }
	}

	/// True when both a reader and a bundler are registered for the chain.
	pub fn supports_chain(&self, chain_id: u64) -> bool {
		self.readers.contains_key(&chain_id) && self.bundlers.contains_key(&chain_id)
	}

	fn reader(&self, chain_id: u64) -> Result<&Arc<dyn ChainReader>, DeliveryError> {
		self.readers
			.get(&chain_id)
			.ok_or(DeliveryError::NoImplementationAvailable(chain_id))
	}

	fn bundler(&self, chain_id: u64) -> Result<&Arc<dyn BundlerInterface>, DeliveryError> {
		self.bundlers
			.get(&chain_id)
			.ok_or(DeliveryError::NoImplementationAvailable(chain_id))
	}

	/// Executes a contract call (eth_call) on the given chain.
	pub async fn contract_call(
		&self,
		chain_id: u64,
		to: Address,
		data: Bytes,
	) -> Result<Bytes, DeliveryError> {
		self.reader(chain_id)?.call(chain_id, to, data).await
	}

	/// True when code is deployed at `address`.
	pub async fn is_deployed(&self, chain_id: u64, address: Address) -> Result<bool, DeliveryError> {
		let code = self.reader(chain_id)?.get_code(chain_id, address).await?;
		Ok(!code.is_empty())
	}

	pub async fn estimate_fees(&self, chain_id: u64) -> Result<GasFees, DeliveryError> {
		self.reader(chain_id)?.estimate_fees(chain_id).await
	}

	/// EntryPoint nonce of `account` under `key`.
	pub async fn get_nonce(
		&self,
		chain_id: u64,
		entry_point: Address,
		account: Address,
		key: U192,
	) -> Result<U256, DeliveryError> {
		let data = IEntryPoint::getNonceCall { sender: account, key }.abi_encode();
		let raw = self.contract_call(chain_id, entry_point, data.into()).await?;
		IEntryPoint::getNonceCall::abi_decode_returns(&raw)
			.map_err(|e| DeliveryError::Decode(format!("getNonce: {}", e)))
	}

	/// EIP-712 domain of `account` as reported by ERC-5267.
	pub async fn account_domain(
		&self,
		chain_id: u64,
		account: Address,
	) -> Result<AccountDomain, DeliveryError> {
		let raw = self
			.contract_call(chain_id, account, IERC5267::eip712DomainCall {}.abi_encode().into())
			.await?;
		let domain = IERC5267::eip712DomainCall::abi_decode_returns(&raw)
			.map_err(|e| DeliveryError::Decode(format!("eip712Domain: {}", e)))?;

		AccountDomain::from_eip5267(
			domain.fields.0[0],
			domain.name,
			domain.version,
			domain.chainId,
			domain.verifyingContract,
			domain.salt,
		)
		.map_err(DeliveryError::from)
	}

	/// Whether `permission_id` is enabled for `account` on the Smart Sessions module.
	pub async fn is_permission_enabled(
		&self,
		chain_id: u64,
		smart_sessions: Address,
		permission_id: B256,
		account: Address,
	) -> Result<bool, DeliveryError> {
		let data = ISmartSession::isPermissionEnabledCall { permissionId: permission_id, account }
			.abi_encode();
		let raw = self.contract_call(chain_id, smart_sessions, data.into()).await?;
		ISmartSession::isPermissionEnabledCall::abi_decode_returns(&raw)
			.map_err(|e| DeliveryError::Decode(format!("isPermissionEnabled: {}", e)))
	}

	pub async fn estimate_user_operation_gas(
		&self,
		chain_id: u64,
		user_op: &PackedUserOperation,
		entry_point: Address,
	) -> Result<UserOperationGasEstimate, DeliveryError> {
		self.bundler(chain_id)?
			.estimate_user_operation_gas(chain_id, user_op, entry_point)
			.await
	}

	pub async fn send_user_operation(
		&self,
		chain_id: u64,
		user_op: &PackedUserOperation,
		entry_point: Address,
	) -> Result<B256, DeliveryError> {
		self.bundler(chain_id)?
			.send_user_operation(chain_id, user_op, entry_point)
			.await
	}

	pub async fn get_user_operation_receipt(
		&self,
		chain_id: u64,
		hash: B256,
	) -> Result<Option<UserOperationReceipt>, DeliveryError> {
		self.bundler(chain_id)?
			.get_user_operation_receipt(chain_id, hash)
			.await
	}
}

//! Alloy-based chain reader.
//!
//! One HTTP provider per configured chain, each wrapped in a retry layer for
//! rate limits and transient transport failures.

use crate::{ChainReader, DeliveryError};
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::TransactionRequest;
use alloy_transport::layers::RetryBackoffLayer;
use async_trait::async_trait;
use omni_types::GasFees;
use std::collections::HashMap;

/// Alloy-based EVM chain reader supporting multiple networks.
pub struct AlloyChainReader {
	/// Alloy providers for each supported network.
	providers: HashMap<u64, DynProvider>,
}

impl AlloyChainReader {
	/// Creates providers for every `(chain_id, rpc_url)` pair.
	pub fn new(rpc_urls: &HashMap<u64, String>) -> Result<Self, DeliveryError> {
		if rpc_urls.is_empty() {
			return Err(DeliveryError::Network(
				"At least one network must be specified".to_string(),
			));
		}

		let mut providers = HashMap::new();
		for (chain_id, rpc_url) in rpc_urls {
			let url = rpc_url.parse().map_err(|e| {
				DeliveryError::Network(format!("Invalid RPC URL for network {}: {}", chain_id, e))
			})?;

			// Configure retry layer for handling network errors and rate limits
			let retry_layer = RetryBackoffLayer::new(
				5,    // max_retry: retry up to 5 times
				1000, // backoff: initial backoff in milliseconds
				10,   // cups: compute units per second
			);
			let client = RpcClient::builder().layer(retry_layer).http(url);
			let provider = ProviderBuilder::new().connect_client(client);

			providers.insert(*chain_id, provider.erased());
		}

		Ok(Self { providers })
	}

	/// Gets the provider for a specific chain ID.
	fn get_provider(&self, chain_id: u64) -> Result<&DynProvider, DeliveryError> {
		self.providers
			.get(&chain_id)
			.ok_or(DeliveryError::NoImplementationAvailable(chain_id))
	}
}

#[async_trait]
impl ChainReader for AlloyChainReader {
	async fn call(&self, chain_id: u64, to: Address, data: Bytes) -> Result<Bytes, DeliveryError> {
		let provider = self.get_provider(chain_id)?;
		tracing::debug!(chain_id, %to, data_len = data.len(), "eth_call");

		let request = TransactionRequest::default().to(to).input(data.into());
		provider
			.call(request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to execute eth_call: {}", e)))
	}

	async fn get_code(&self, chain_id: u64, address: Address) -> Result<Bytes, DeliveryError> {
		let provider = self.get_provider(chain_id)?;
		provider
			.get_code_at(address)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get code: {}", e)))
	}

	async fn estimate_fees(&self, chain_id: u64) -> Result<GasFees, DeliveryError> {
		let provider = self.get_provider(chain_id)?;
		let estimate = provider
			.estimate_eip1559_fees()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to estimate fees: {}", e)))?;

		Ok(GasFees {
			max_fee_per_gas: U256::from(estimate.max_fee_per_gas),
			max_priority_fee_per_gas: U256::from(estimate.max_priority_fee_per_gas),
		})
	}
}

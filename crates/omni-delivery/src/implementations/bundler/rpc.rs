//! JSON-RPC bundler client (ERC-4337 v0.7 wire format).

use crate::{BundlerInterface, DeliveryError};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rpc_client::RpcClient;
use alloy_transport::{layers::RetryBackoffLayer, TransportError};
use async_trait::async_trait;
use omni_types::{truncate_id, PackedUserOperation, UserOperationGasEstimate, UserOperationReceipt};
use serde::Serialize;
use std::collections::HashMap;

/// User operation as sent over JSON-RPC: factory and paymaster fields unpacked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcUserOperation {
	pub sender: Address,
	pub nonce: U256,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub factory: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub factory_data: Option<Bytes>,
	pub call_data: Bytes,
	pub call_gas_limit: U256,
	pub verification_gas_limit: U256,
	pub pre_verification_gas: U256,
	pub max_fee_per_gas: U256,
	pub max_priority_fee_per_gas: U256,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paymaster: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paymaster_verification_gas_limit: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paymaster_post_op_gas_limit: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub paymaster_data: Option<Bytes>,
	pub signature: Bytes,
}

impl From<&PackedUserOperation> for RpcUserOperation {
	fn from(op: &PackedUserOperation) -> Self {
		let (factory, factory_data) = match op.factory() {
			Some((factory, data)) => (Some(factory), Some(data)),
			None => (None, None),
		};

		// paymaster(20) ‖ verificationGasLimit(16) ‖ postOpGasLimit(16) ‖ data
		let pm = &op.paymaster_and_data;
		let (paymaster, pm_verification, pm_post_op, pm_data) = if pm.len() >= 52 {
			(
				Some(Address::from_slice(&pm[..20])),
				Some(U256::from_be_slice(&pm[20..36])),
				Some(U256::from_be_slice(&pm[36..52])),
				Some(Bytes::copy_from_slice(&pm[52..])),
			)
		} else {
			(None, None, None, None)
		};

		Self {
			sender: op.sender,
			nonce: op.nonce,
			factory,
			factory_data,
			call_data: op.call_data.clone(),
			call_gas_limit: op.call_gas_limit,
			verification_gas_limit: op.verification_gas_limit,
			pre_verification_gas: op.pre_verification_gas,
			max_fee_per_gas: op.max_fee_per_gas,
			max_priority_fee_per_gas: op.max_priority_fee_per_gas,
			paymaster,
			paymaster_verification_gas_limit: pm_verification,
			paymaster_post_op_gas_limit: pm_post_op,
			paymaster_data: pm_data,
			signature: op.signature.clone(),
		}
	}
}

/// Bundler client with one JSON-RPC connection per chain.
pub struct RpcBundler {
	clients: HashMap<u64, RpcClient>,
}

impl RpcBundler {
	/// Creates clients for every `(chain_id, bundler_url)` pair.
	pub fn new(bundler_urls: &HashMap<u64, String>) -> Result<Self, DeliveryError> {
		let mut clients = HashMap::new();
		for (chain_id, bundler_url) in bundler_urls {
			let url = bundler_url.parse().map_err(|e| {
				DeliveryError::Network(format!("Invalid bundler URL for network {}: {}", chain_id, e))
			})?;
			let retry_layer = RetryBackoffLayer::new(5, 1000, 10);
			clients.insert(*chain_id, RpcClient::builder().layer(retry_layer).http(url));
		}
		Ok(Self { clients })
	}

	fn get_client(&self, chain_id: u64) -> Result<&RpcClient, DeliveryError> {
		self.clients
			.get(&chain_id)
			.ok_or(DeliveryError::NoImplementationAvailable(chain_id))
	}
}

/// JSON-RPC error responses carry the bundler's reason; everything else is transport.
fn map_rpc_error(method: &str, error: TransportError) -> DeliveryError {
	match error.as_error_resp() {
		Some(payload) => DeliveryError::Rejected(format!(
			"{} (code {}): {}",
			method, payload.code, payload.message
		)),
		None => DeliveryError::Network(format!("{} failed: {}", method, error)),
	}
}

#[async_trait]
impl BundlerInterface for RpcBundler {
	async fn estimate_user_operation_gas(
		&self,
		chain_id: u64,
		user_op: &PackedUserOperation,
		entry_point: Address,
	) -> Result<UserOperationGasEstimate, DeliveryError> {
		let client = self.get_client(chain_id)?;
		client
			.request("eth_estimateUserOperationGas", (RpcUserOperation::from(user_op), entry_point))
			.await
			.map_err(|e| map_rpc_error("eth_estimateUserOperationGas", e))
	}

	async fn send_user_operation(
		&self,
		chain_id: u64,
		user_op: &PackedUserOperation,
		entry_point: Address,
	) -> Result<B256, DeliveryError> {
		let client = self.get_client(chain_id)?;
		let hash: B256 = client
			.request("eth_sendUserOperation", (RpcUserOperation::from(user_op), entry_point))
			.await
			.map_err(|e| {
				tracing::error!(chain_id, "User operation submission failed: {}", e);
				map_rpc_error("eth_sendUserOperation", e)
			})?;

		tracing::info!(
			chain_id,
			user_op_hash = %truncate_id(&hash.to_string()),
			"User operation accepted by bundler"
		);
		Ok(hash)
	}

	async fn get_user_operation_receipt(
		&self,
		chain_id: u64,
		hash: B256,
	) -> Result<Option<UserOperationReceipt>, DeliveryError> {
		let client = self.get_client(chain_id)?;
		client
			.request("eth_getUserOperationReceipt", (hash,))
			.await
			.map_err(|e| map_rpc_error("eth_getUserOperationReceipt", e))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use omni_types::standards::erc4337::ENTRY_POINT_V07;
	use serde_json::{json, Value};
	use wiremock::{
		matchers::{body_partial_json, method},
		Mock, MockServer, Request, Respond, ResponseTemplate,
	};

	/// Answers a JSON-RPC call with `result` or `error`, echoing the request id.
	struct JsonRpcResponder {
		body: Value,
	}

	impl JsonRpcResponder {
		fn result(result: Value) -> Self {
			Self { body: json!({ "result": result }) }
		}

		fn error(code: i64, message: &str) -> Self {
			Self { body: json!({ "error": { "code": code, "message": message } }) }
		}
	}

	impl Respond for JsonRpcResponder {
		fn respond(&self, request: &Request) -> ResponseTemplate {
			let req: Value = serde_json::from_slice(&request.body).unwrap();
			let mut body = self.body.clone();
			body["jsonrpc"] = json!("2.0");
			body["id"] = req["id"].clone();
			ResponseTemplate::new(200).set_body_json(body)
		}
	}

	fn user_op() -> PackedUserOperation {
		PackedUserOperation {
			sender: Address::repeat_byte(0x11),
			nonce: U256::from(1),
			init_code: Bytes::new(),
			call_data: Bytes::from_static(&[0x01]),
			call_gas_limit: U256::from(1),
			verification_gas_limit: U256::from(2),
			pre_verification_gas: U256::from(3),
			max_fee_per_gas: U256::from(4),
			max_priority_fee_per_gas: U256::from(5),
			paymaster_and_data: Bytes::new(),
			signature: Bytes::from_static(&[0x02]),
		}
	}

	async fn bundler_for(server: &MockServer) -> RpcBundler {
		let mut urls = HashMap::new();
		urls.insert(8453, server.uri());
		RpcBundler::new(&urls).unwrap()
	}

	#[test]
	fn test_rpc_format_unpacks_factory_and_paymaster() {
		let mut op = user_op();
		let mut init_code = Address::repeat_byte(0x22).to_vec();
		init_code.extend_from_slice(&[0xaa, 0xbb]);
		op.init_code = init_code.into();

		let mut pm = Address::repeat_byte(0x33).to_vec();
		pm.extend_from_slice(&100u128.to_be_bytes());
		pm.extend_from_slice(&200u128.to_be_bytes());
		pm.extend_from_slice(&[0xcc]);
		op.paymaster_and_data = pm.into();

		let rpc = RpcUserOperation::from(&op);
		assert_eq!(rpc.factory, Some(Address::repeat_byte(0x22)));
		assert_eq!(rpc.factory_data.as_ref().map(|b| &b[..]), Some(&[0xaa, 0xbb][..]));
		assert_eq!(rpc.paymaster, Some(Address::repeat_byte(0x33)));
		assert_eq!(rpc.paymaster_verification_gas_limit, Some(U256::from(100)));
		assert_eq!(rpc.paymaster_post_op_gas_limit, Some(U256::from(200)));
		assert_eq!(rpc.paymaster_data.as_ref().map(|b| &b[..]), Some(&[0xcc][..]));
	}

	#[test]
	fn test_rpc_format_omits_absent_fields() {
		let json = serde_json::to_value(RpcUserOperation::from(&user_op())).unwrap();
		assert!(json.get("factory").is_none());
		assert!(json.get("paymaster").is_none());
		assert_eq!(json["callGasLimit"], "0x1");
	}

	#[tokio::test]
	async fn test_send_user_operation_returns_hash() {
		let server = MockServer::start().await;
		let hash = B256::repeat_byte(0xab);
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": "eth_sendUserOperation" })))
			.respond_with(JsonRpcResponder::result(json!(hash)))
			.expect(1)
			.mount(&server)
			.await;

		let bundler = bundler_for(&server).await;
		let result = bundler.send_user_operation(8453, &user_op(), ENTRY_POINT_V07).await.unwrap();
		assert_eq!(result, hash);
	}

	#[tokio::test]
	async fn test_rejection_carries_upstream_reason() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(JsonRpcResponder::error(-32500, "AA21 didn't pay prefund"))
			.mount(&server)
			.await;

		let bundler = bundler_for(&server).await;
		let err = bundler
			.send_user_operation(8453, &user_op(), ENTRY_POINT_V07)
			.await
			.unwrap_err();
		match err {
			DeliveryError::Rejected(reason) => assert!(reason.contains("AA21")),
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_pending_receipt_is_none() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": "eth_getUserOperationReceipt" })))
			.respond_with(JsonRpcResponder::result(Value::Null))
			.mount(&server)
			.await;

		let bundler = bundler_for(&server).await;
		let receipt = bundler
			.get_user_operation_receipt(8453, B256::repeat_byte(0x01))
			.await
			.unwrap();
		assert!(receipt.is_none());
	}

	#[tokio::test]
	async fn test_gas_estimate_is_decoded() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(body_partial_json(json!({ "method": "eth_estimateUserOperationGas" })))
			.respond_with(JsonRpcResponder::result(json!({
				"preVerificationGas": "0xc350",
				"verificationGasLimit": "0x30d40",
				"callGasLimit": "0x186a0"
			})))
			.mount(&server)
			.await;

		let bundler = bundler_for(&server).await;
		let estimate = bundler
			.estimate_user_operation_gas(8453, &user_op(), ENTRY_POINT_V07)
			.await
			.unwrap();
		assert_eq!(estimate.call_gas_limit, U256::from(100_000));
		assert_eq!(estimate.pre_verification_gas, U256::from(50_000));
	}

	#[tokio::test]
	async fn test_unknown_chain() {
		let bundler = RpcBundler::new(&HashMap::new()).unwrap();
		let result = bundler.get_user_operation_receipt(1, B256::ZERO).await;
		assert!(matches!(result, Err(DeliveryError::NoImplementationAvailable(1))));
	}
}

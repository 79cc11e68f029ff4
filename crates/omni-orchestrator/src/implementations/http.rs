//! HTTP orchestrator client.

use crate::{OrchestratorError, OrchestratorInterface};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use omni_types::{
	BundleResult, BundleSubmission, MetaIntent, OrderPath, OrderPathEntry, SecretString,
	SignedOrderBundle,
};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the account's API key.
const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderPathResponse {
	order_bundles: Vec<OrderPathEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleEnvelope<'a> {
	signed_order_bundle: &'a SignedOrderBundle,
}

#[derive(Debug, Serialize)]
struct PostBundlesRequest<'a> {
	bundles: Vec<BundleEnvelope<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostBundlesResponse {
	bundle_results: Vec<BundleSubmission>,
}

/// HTTP client for the orchestrator service.
///
/// Every request carries the account's API key. No request is retried here;
/// only status polling is retried, by the caller.
#[derive(Clone)]
pub struct HttpOrchestrator {
	client: Client,
	base_url: String,
	api_key: SecretString,
}

impl std::fmt::Debug for HttpOrchestrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpOrchestrator")
			.field("base_url", &self.base_url)
			.field("api_key", &self.api_key)
			.finish()
	}
}

impl HttpOrchestrator {
	/// Creates a new client with the given request timeout.
	pub fn new(
		base_url: &str,
		api_key: SecretString,
		timeout: Duration,
	) -> Result<Self, OrchestratorError> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| OrchestratorError::Http(e.to_string()))?;

		Ok(Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
			api_key,
		})
	}

	async fn post<Req, Res>(&self, path: &str, body: &Req) -> Result<Res, OrchestratorError>
	where
		Req: Serialize + ?Sized,
		Res: DeserializeOwned,
	{
		let url = format!("{}{}", self.base_url, path);
		tracing::debug!(%url, "POST orchestrator");

		let request = self
			.api_key
			.with_exposed(|key| self.client.post(&url).header(API_KEY_HEADER, key).json(body));
		let response = request.send().await.map_err(|e| OrchestratorError::Http(e.to_string()))?;
		self.handle_response(response).await
	}

	async fn get<Res>(&self, path: &str) -> Result<Res, OrchestratorError>
	where
		Res: DeserializeOwned,
	{
		let url = format!("{}{}", self.base_url, path);
		tracing::debug!(%url, "GET orchestrator");

		let request = self
			.api_key
			.with_exposed(|key| self.client.get(&url).header(API_KEY_HEADER, key));
		let response = request.send().await.map_err(|e| OrchestratorError::Http(e.to_string()))?;
		self.handle_response(response).await
	}

	async fn handle_response<T: DeserializeOwned>(
		&self,
		response: Response,
	) -> Result<T, OrchestratorError> {
		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response
				.text()
				.await
				.unwrap_or_else(|_| "Unknown error".to_string());
			return Err(OrchestratorError::Rejected { status, message });
		}

		response
			.json::<T>()
			.await
			.map_err(|e| OrchestratorError::InvalidResponse(e.to_string()))
	}
}

#[async_trait]
impl OrchestratorInterface for HttpOrchestrator {
	async fn get_order_path(
		&self,
		intent: &MetaIntent,
		account: Address,
	) -> Result<OrderPath, OrchestratorError> {
		let response: OrderPathResponse =
			self.post(&format!("/accounts/{}/bundles/path", account), intent).await?;

		if response.order_bundles.is_empty() {
			return Err(OrchestratorError::InvalidResponse("empty order path".to_string()));
		}
		tracing::debug!(entries = response.order_bundles.len(), "Received order path");
		Ok(response.order_bundles)
	}

	async fn post_signed_order_bundle(
		&self,
		bundle: &SignedOrderBundle,
	) -> Result<BundleSubmission, OrchestratorError> {
		let request = PostBundlesRequest {
			bundles: vec![BundleEnvelope { signed_order_bundle: bundle }],
		};
		let response: PostBundlesResponse = self.post("/bundles", &request).await?;

		response.bundle_results.into_iter().next().ok_or_else(|| {
			OrchestratorError::InvalidResponse("no bundle result returned".to_string())
		})
	}

	async fn get_bundle_status(&self, bundle_id: U256) -> Result<BundleResult, OrchestratorError> {
		self.get(&format!("/bundles/{}", bundle_id)).await
	}
}

//! Builds a [`SmartAccount`] and its collaborators from configuration.

use anyhow::{Context, Result};
use omni_account::{signer_from_secret, AccountSigner, OwnerSigner};
use omni_config::Config;
use omni_core::{AccountContext, RetryPolicy, SmartAccount};
use omni_delivery::{
	implementations::{bundler::rpc::RpcBundler, evm::alloy::AlloyChainReader},
	BundlerInterface, ChainReader, DeliveryService,
};
use omni_orchestrator::HttpOrchestrator;
use omni_types::SecretString;
use std::{collections::HashMap, sync::Arc, time::Duration};

/// Wires JSON-RPC readers, bundlers and the orchestrator client for `config`.
///
/// Passkey owners need an authenticator, which a command-line process does
/// not have, so only ECDSA owners can sign from here.
pub fn build_account(config: &Config) -> Result<SmartAccount> {
	let reader: Arc<dyn ChainReader> = Arc::new(
		AlloyChainReader::new(&config.rpc_urls()).context("Failed to create chain reader")?,
	);
	let bundler: Arc<dyn BundlerInterface> = Arc::new(
		RpcBundler::new(&config.bundler_urls()).context("Failed to create bundler client")?,
	);

	let readers: HashMap<u64, Arc<dyn ChainReader>> =
		config.networks.keys().map(|chain_id| (*chain_id, reader.clone())).collect();
	let bundlers: HashMap<u64, Arc<dyn BundlerInterface>> =
		config.networks.keys().map(|chain_id| (*chain_id, bundler.clone())).collect();

	let orchestrator = HttpOrchestrator::new(
		&config.orchestrator.url,
		config.account.api_key.clone(),
		Duration::from_secs(config.orchestrator.timeout_seconds),
	)
	.context("Failed to create orchestrator client")?;

	let owners = OwnerSigner::from_config(
		&config.owner_config(),
		signers(config.owner_private_keys()).context("Invalid owner key")?,
		None,
	)?;
	let session_signers =
		signers(&config.account.session_private_keys).context("Invalid session key")?;

	let ctx = AccountContext::new(
		config.account_config(),
		DeliveryService::new(readers, bundlers),
		Arc::new(orchestrator),
		owners,
		session_signers,
		RetryPolicy::from(&config.polling),
	);

	tracing::info!(
		account = %ctx.address(),
		kind = %ctx.config.kind,
		chains = config.networks.len(),
		"Account ready"
	);
	Ok(SmartAccount::new(ctx))
}

fn signers(keys: &[SecretString]) -> Result<Vec<AccountSigner>, omni_account::AccountError> {
	keys.iter().map(signer_from_secret).collect()
}

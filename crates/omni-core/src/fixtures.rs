//! Shared mocks and accounts for pipeline and session tests.

use crate::{context::AccountContext, polling::RetryPolicy};
use alloy_primitives::{address, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use omni_account::{signer_from_secret, AccountSigner, OwnerSigner};
use omni_delivery::{
	BundlerInterface, ChainReader, DeliveryError, DeliveryService, MockBundlerInterface,
	MockChainReader,
};
use omni_orchestrator::{MockOrchestratorInterface, OrchestratorInterface};
use omni_types::{
	session::interfaces::ISmartSession,
	standards::erc7579::interfaces::{IERC5267, IEntryPoint},
	AccountConfig, AccountKind, ContractAddresses, GasFees, OwnerConfig, SecretString,
	UserOperationGasEstimate,
};
use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::Duration,
};

pub const ACCOUNT: Address = address!("1111111111111111111111111111111111111111");
pub const TARGET_CHAIN: u64 = 8453;
pub const SOURCE_CHAIN: u64 = 10;

/// Well-known development keys.
pub const KEYS: [&str; 3] = [
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
	"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
	"0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub fn signer(index: usize) -> AccountSigner {
	signer_from_secret(&SecretString::from(KEYS[index])).unwrap()
}

pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
	RetryPolicy {
		interval: Duration::from_millis(1),
		max_attempts,
		backoff_multiplier: 1.0,
		max_interval: Duration::from_millis(1),
	}
}

/// A chain reader answering nonce, domain and session-state reads.
///
/// `installed` is shared so bundler mocks can flip it when an installation lands.
pub fn chain_reader(installed: Arc<AtomicBool>) -> MockChainReader {
	let mut reader = MockChainReader::new();
	reader.expect_call().returning(move |chain_id, to, data| {
		let selector: [u8; 4] = data.get(..4).and_then(|s| s.try_into().ok()).unwrap_or_default();
		let response: Result<Bytes, DeliveryError> = if selector == IEntryPoint::getNonceCall::SELECTOR {
			Ok(U256::from(7).abi_encode().into())
		} else if selector == ISmartSession::isPermissionEnabledCall::SELECTOR {
			Ok(installed.load(Ordering::SeqCst).abi_encode().into())
		} else if selector == IERC5267::eip712DomainCall::SELECTOR {
			let domain = (
				FixedBytes::<1>::from([0x0f]),
				"Nexus".to_string(),
				"1.2.0".to_string(),
				U256::from(chain_id),
				to,
				B256::ZERO,
				Vec::<U256>::new(),
			);
			Ok(domain.abi_encode_params().into())
		} else {
			Err(DeliveryError::Rejected(format!("unexpected call to {}", to)))
		};
		Box::pin(async move { response })
	});
	reader
		.expect_get_code()
		.returning(|_, _| Box::pin(async move { Ok(Bytes::from_static(&[0x60, 0x80])) }));
	reader.expect_estimate_fees().returning(|_| {
		Box::pin(async move {
			Ok(GasFees {
				max_fee_per_gas: U256::from(2_000_000_000u64),
				max_priority_fee_per_gas: U256::from(1_000_000_000u64),
			})
		})
	});
	reader
}

/// Bundler with gas estimation only; tests add send and receipt expectations.
pub fn bundler() -> MockBundlerInterface {
	let mut bundler = MockBundlerInterface::new();
	bundler.expect_estimate_user_operation_gas().returning(|_, _, _| {
		Box::pin(async move {
			Ok(UserOperationGasEstimate {
				pre_verification_gas: U256::from(50_000),
				verification_gas_limit: U256::from(150_000),
				call_gas_limit: U256::from(100_000),
			})
		})
	});
	bundler
}

pub struct ContextBuilder {
	reader: Option<MockChainReader>,
	bundler: Option<MockBundlerInterface>,
	orchestrator: Option<MockOrchestratorInterface>,
	owners: Vec<Address>,
	threshold: usize,
	owner_keys: Vec<usize>,
	session_keys: Vec<usize>,
	retry: RetryPolicy,
}

impl ContextBuilder {
	/// Single owner (key 0), session key 2, nothing mocked.
	pub fn new() -> Self {
		Self {
			reader: None,
			bundler: None,
			orchestrator: None,
			owners: vec![signer(0).address()],
			threshold: 1,
			owner_keys: vec![0],
			session_keys: vec![2],
			retry: fast_policy(5),
		}
	}

	pub fn with_reader(mut self, reader: MockChainReader) -> Self {
		self.reader = Some(reader);
		self
	}

	pub fn with_bundler(mut self, bundler: MockBundlerInterface) -> Self {
		self.bundler = Some(bundler);
		self
	}

	pub fn with_orchestrator(mut self, orchestrator: MockOrchestratorInterface) -> Self {
		self.orchestrator = Some(orchestrator);
		self
	}

	/// Owners from key indices, with only `local` keys available for signing.
	pub fn with_owners(mut self, owners: &[usize], threshold: usize, local: &[usize]) -> Self {
		self.owners = owners.iter().map(|i| signer(*i).address()).collect();
		self.threshold = threshold;
		self.owner_keys = local.to_vec();
		self
	}

	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	pub fn build(self) -> Arc<AccountContext> {
		let reader: Arc<dyn ChainReader> = Arc::new(self.reader.unwrap_or_default());
		let bundler: Arc<dyn BundlerInterface> = Arc::new(self.bundler.unwrap_or_default());
		let orchestrator: Arc<dyn OrchestratorInterface> =
			Arc::new(self.orchestrator.unwrap_or_default());

		let chains = [TARGET_CHAIN, SOURCE_CHAIN];
		let readers: HashMap<u64, Arc<dyn ChainReader>> =
			chains.iter().map(|c| (*c, reader.clone())).collect();
		let bundlers: HashMap<u64, Arc<dyn BundlerInterface>> =
			chains.iter().map(|c| (*c, bundler.clone())).collect();

		let owner_config = OwnerConfig::Ecdsa { owners: self.owners, threshold: self.threshold };
		let owners = OwnerSigner::from_config(
			&owner_config,
			self.owner_keys.iter().map(|i| signer(*i)).collect(),
			None,
		)
		.unwrap();

		let config = AccountConfig {
			address: ACCOUNT,
			kind: AccountKind::Nexus,
			owners: owner_config,
			init_code: None,
			api_key: SecretString::from("test-key"),
			contracts: ContractAddresses::default(),
		};

		Arc::new(AccountContext::new(
			config,
			DeliveryService::new(readers, bundlers),
			orchestrator,
			owners,
			self.session_keys.iter().map(|i| signer(*i)).collect(),
			self.retry,
		))
	}
}

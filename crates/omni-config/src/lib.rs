//! Configuration module for omnichain smart account clients.
//!
//! Configuration is loaded from TOML. `${VAR}` and `${VAR:-default}`
//! references are resolved from the environment before parsing, and the
//! result is validated before any component is built from it.

use alloy_primitives::{Address, Bytes, B256, U256};
use omni_types::{AccountConfig, AccountKind, ContractAddresses, OwnerConfig, SecretString};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::{
	collections::{BTreeMap, HashMap, HashSet},
	path::Path,
	str::FromStr,
	time::Duration,
};
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// The smart account and its owners.
	pub account: AccountSection,
	/// Orchestrator service endpoint.
	pub orchestrator: OrchestratorConfig,
	/// Bounded polling used by the wait stage.
	#[serde(default)]
	pub polling: PollingConfig,
	/// Contract address overrides.
	#[serde(default)]
	pub contracts: ContractAddresses,
	/// Per-chain endpoints, keyed by chain id.
	#[serde(deserialize_with = "deserialize_networks")]
	pub networks: BTreeMap<u64, NetworkConfig>,
}

/// `[account]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSection {
	pub address: Address,
	pub kind: AccountKind,
	#[serde(default)]
	pub init_code: Option<Bytes>,
	pub api_key: SecretString,
	pub owners: OwnersSection,
	/// Private keys of session signers, matched to sessions by owner address.
	#[serde(default)]
	pub session_private_keys: Vec<SecretString>,
}

/// `[account.owners]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OwnersSection {
	Ecdsa {
		addresses: Vec<Address>,
		#[serde(default = "default_threshold")]
		threshold: usize,
		/// Locally held owner keys; may cover fewer owners than the threshold.
		#[serde(default)]
		private_keys: Vec<SecretString>,
	},
	Passkey {
		public_key_x: U256,
		public_key_y: U256,
		credential_ids: Vec<B256>,
	},
}

fn default_threshold() -> usize {
	1
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
	pub url: String,
	#[serde(default = "default_orchestrator_timeout")]
	pub timeout_seconds: u64,
}

fn default_orchestrator_timeout() -> u64 {
	30
}

/// `[polling]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
	#[serde(default = "default_interval_ms")]
	pub interval_ms: u64,
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_backoff_multiplier")]
	pub backoff_multiplier: f64,
	#[serde(default = "default_max_interval_ms")]
	pub max_interval_ms: u64,
}

impl Default for PollingConfig {
	fn default() -> Self {
		Self {
			interval_ms: default_interval_ms(),
			max_attempts: default_max_attempts(),
			backoff_multiplier: default_backoff_multiplier(),
			max_interval_ms: default_max_interval_ms(),
		}
	}
}

impl PollingConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}

	pub fn max_interval(&self) -> Duration {
		Duration::from_millis(self.max_interval_ms)
	}
}

fn default_interval_ms() -> u64 {
	1000
}

fn default_max_attempts() -> u32 {
	120
}

fn default_backoff_multiplier() -> f64 {
	1.5
}

fn default_max_interval_ms() -> u64 {
	10_000
}

/// `[networks.<chain_id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
	pub rpc_url: String,
	pub bundler_url: String,
}

/// TOML table keys are strings; chain ids must parse as integers.
fn deserialize_networks<'de, D>(deserializer: D) -> Result<BTreeMap<u64, NetworkConfig>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = HashMap::<String, NetworkConfig>::deserialize(deserializer)?;
	raw.into_iter()
		.map(|(key, network)| {
			key.parse::<u64>()
				.map(|chain_id| (chain_id, network))
				.map_err(|_| serde::de::Error::custom(format!("Invalid chain id: {}", key)))
		})
		.collect()
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)));
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads, resolves and validates a configuration file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.account.api_key.is_empty() {
			return Err(ConfigError::Validation("account.api_key cannot be empty".into()));
		}

		match &self.account.owners {
			OwnersSection::Ecdsa { addresses, threshold, .. } => {
				if addresses.is_empty() {
					return Err(ConfigError::Validation("At least one owner is required".into()));
				}
				if *threshold == 0 || *threshold > addresses.len() {
					return Err(ConfigError::Validation(format!(
						"Owner threshold must be between 1 and {}, got {}",
						addresses.len(),
						threshold
					)));
				}
				let unique: HashSet<_> = addresses.iter().collect();
				if unique.len() != addresses.len() {
					return Err(ConfigError::Validation("Duplicate owner addresses".into()));
				}
			},
			OwnersSection::Passkey { credential_ids, .. } => {
				if credential_ids.is_empty() {
					return Err(ConfigError::Validation(
						"Passkey owners need at least one credential id".into(),
					));
				}
			},
		}

		if self.orchestrator.url.trim().is_empty() {
			return Err(ConfigError::Validation("orchestrator.url cannot be empty".into()));
		}
		if self.orchestrator.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"orchestrator.timeout_seconds must be greater than 0".into(),
			));
		}

		let polling = &self.polling;
		if polling.interval_ms == 0 || polling.max_attempts == 0 {
			return Err(ConfigError::Validation(
				"polling.interval_ms and polling.max_attempts must be greater than 0".into(),
			));
		}
		if !polling.backoff_multiplier.is_finite() || polling.backoff_multiplier < 1.0 {
			return Err(ConfigError::Validation(
				"polling.backoff_multiplier must be at least 1.0".into(),
			));
		}
		if polling.max_interval_ms < polling.interval_ms {
			return Err(ConfigError::Validation(
				"polling.max_interval_ms must not be below polling.interval_ms".into(),
			));
		}

		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"Networks configuration cannot be empty".into(),
			));
		}
		for (chain_id, network) in &self.networks {
			if network.rpc_url.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} is missing rpc_url",
					chain_id
				)));
			}
			if network.bundler_url.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"Network {} is missing bundler_url",
					chain_id
				)));
			}
		}

		Ok(())
	}

	/// Owner scheme as seen by the account layer.
	pub fn owner_config(&self) -> OwnerConfig {
		match &self.account.owners {
			OwnersSection::Ecdsa { addresses, threshold, .. } => OwnerConfig::Ecdsa {
				owners: addresses.clone(),
				threshold: *threshold,
			},
			OwnersSection::Passkey { public_key_x, public_key_y, credential_ids } => {
				OwnerConfig::Passkey {
					public_key_x: *public_key_x,
					public_key_y: *public_key_y,
					credential_ids: credential_ids.clone(),
				}
			},
		}
	}

	/// Immutable account configuration for the account facade.
	pub fn account_config(&self) -> AccountConfig {
		AccountConfig {
			address: self.account.address,
			kind: self.account.kind,
			owners: self.owner_config(),
			init_code: self.account.init_code.clone(),
			api_key: self.account.api_key.clone(),
			contracts: self.contracts,
		}
	}

	/// Locally held owner keys.
	pub fn owner_private_keys(&self) -> &[SecretString] {
		match &self.account.owners {
			OwnersSection::Ecdsa { private_keys, .. } => private_keys,
			OwnersSection::Passkey { .. } => &[],
		}
	}

	pub fn rpc_urls(&self) -> HashMap<u64, String> {
		self.networks.iter().map(|(id, n)| (*id, n.rpc_url.clone())).collect()
	}

	pub fn bundler_urls(&self) -> HashMap<u64, String> {
		self.networks.iter().map(|(id, n)| (*id, n.bundler_url.clone())).collect()
	}
}

/// Parses TOML, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[account]
address = "0x1111111111111111111111111111111111111111"
kind = "nexus"
api_key = "test-key"

[account.owners]
type = "ecdsa"
addresses = [
	"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
	"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
]
threshold = 1
private_keys = ["0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"]

[orchestrator]
url = "https://orchestrator.example"

[networks.8453]
rpc_url = "http://localhost:8545"
bundler_url = "http://localhost:4337"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("OMNI_TEST_HOST", "localhost");
		std::env::set_var("OMNI_TEST_PORT", "5432");

		let input = "host = \"${OMNI_TEST_HOST}:${OMNI_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("OMNI_TEST_HOST");
		std::env::remove_var("OMNI_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${OMNI_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${OMNI_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("OMNI_MISSING_VAR"));
	}

	#[test]
	fn test_oversized_input_rejected() {
		let input = "a".repeat(1024 * 1024 + 1);
		assert!(matches!(resolve_env_vars(&input), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_parse_with_defaults() {
		let config: Config = BASE.parse().unwrap();

		assert_eq!(config.account.kind, AccountKind::Nexus);
		assert_eq!(config.polling.max_attempts, 120);
		assert_eq!(config.polling.interval(), Duration::from_secs(1));
		assert_eq!(config.orchestrator.timeout_seconds, 30);
		assert_eq!(config.contracts, ContractAddresses::default());
		assert_eq!(config.owner_private_keys().len(), 1);
		assert_eq!(config.bundler_urls()[&8453], "http://localhost:4337");

		let account = config.account_config();
		assert!(matches!(account.owners, OwnerConfig::Ecdsa { threshold: 1, .. }));
	}

	#[test]
	fn test_api_key_from_env() {
		std::env::set_var("OMNI_TEST_API_KEY", "from-env");
		let config: Config = BASE
			.replace("api_key = \"test-key\"", "api_key = \"${OMNI_TEST_API_KEY}\"")
			.parse()
			.unwrap();
		config.account.api_key.with_exposed(|key| assert_eq!(key, "from-env"));
		std::env::remove_var("OMNI_TEST_API_KEY");
	}

	#[test]
	fn test_threshold_above_owner_count_rejected() {
		let result: Result<Config, _> = BASE.replace("threshold = 1", "threshold = 3").parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));

		let result: Result<Config, _> = BASE.replace("threshold = 1", "threshold = 0").parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_duplicate_owners_rejected() {
		let result: Result<Config, _> = BASE
			.replace(
				"\"0x70997970C51812dc3A010C7d01b50e0d17dc79C8\"",
				"\"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266\"",
			)
			.parse();
		assert!(result.unwrap_err().to_string().contains("Duplicate"));
	}

	#[test]
	fn test_missing_api_key_rejected() {
		let result: Result<Config, _> =
			BASE.replace("api_key = \"test-key\"", "api_key = \"\"").parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_network_without_bundler_rejected() {
		let result: Result<Config, _> = BASE
			.replace("bundler_url = \"http://localhost:4337\"", "bundler_url = \"\"")
			.parse();
		assert!(result.unwrap_err().to_string().contains("bundler_url"));
	}

	#[test]
	fn test_invalid_chain_id_key_rejected() {
		let result: Result<Config, _> = BASE.replace("[networks.8453]", "[networks.base]").parse();
		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_polling_out_of_range_rejected() {
		let config = format!("{}\n[polling]\nbackoff_multiplier = 0.5\n", BASE);
		let result: Result<Config, _> = config.parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));

		let config = format!("{}\n[polling]\ninterval_ms = 5000\nmax_interval_ms = 1000\n", BASE);
		let result: Result<Config, _> = config.parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_passkey_owners() {
		let config = BASE.replace(
			r#"type = "ecdsa"
addresses = [
	"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
	"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
]
threshold = 1
private_keys = ["0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"]"#,
			r#"type = "passkey"
public_key_x = "0x1"
public_key_y = "0x2"
credential_ids = ["0x0000000000000000000000000000000000000000000000000000000000000001"]"#,
		);
		let config: Config = config.parse().unwrap();
		assert!(matches!(config.owner_config(), OwnerConfig::Passkey { .. }));
		assert!(config.owner_private_keys().is_empty());
	}

	#[test]
	fn test_example_config_parses() {
		for (name, value) in [
			("ACCOUNT_ADDRESS", "0x1111111111111111111111111111111111111111"),
			("ORCHESTRATOR_API_KEY", "key"),
			("OWNER_ADDRESS", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
			(
				"OWNER_PRIVATE_KEY",
				"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
			),
			("ORCHESTRATOR_URL", "http://localhost:3000"),
			("OPTIMISM_BUNDLER_URL", "http://localhost:4337"),
			("BASE_BUNDLER_URL", "http://localhost:4338"),
		] {
			std::env::set_var(name, value);
		}

		let config: Config = include_str!("../../../config/account.example.toml").parse().unwrap();
		assert_eq!(config.networks.len(), 2);
		assert!(config.account.session_private_keys.is_empty());
	}

	#[tokio::test]
	async fn test_from_file() {
		let path = std::env::temp_dir().join("omni-config-test.toml");
		tokio::fs::write(&path, BASE).await.unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.networks.len(), 1);

		tokio::fs::remove_file(&path).await.unwrap();
	}

	#[tokio::test]
	async fn test_from_missing_file() {
		let result = Config::from_file("/nonexistent/omni.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}
}

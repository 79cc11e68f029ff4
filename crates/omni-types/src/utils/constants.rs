//! Well-known contract addresses used by the account stack.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// ERC-4337 EntryPoint v0.7.
pub const ENTRY_POINT_ADDRESS: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");
/// Smart Sessions ERC-7579 validator module.
pub const SMART_SESSIONS_ADDRESS: Address = address!("00000000002B0eCfbD0496EE71e01257dA0E37DE");
/// Ownable (multi-owner ECDSA) validator module.
pub const OWNABLE_VALIDATOR_ADDRESS: Address =
	address!("2483DA3A338895199E5e538530213157e931Bf06");
/// WebAuthn (passkey) validator module.
pub const WEBAUTHN_VALIDATOR_ADDRESS: Address =
	address!("2f167e55d42584f65e2e30a748f41ee75a311414");
/// The Compact resource lock contract.
pub const COMPACT_ADDRESS: Address = address!("00000000000000171ede64904551eeDF3C6C9788");
/// Sudo policy granting unrestricted use of a session action.
pub const SUDO_POLICY_ADDRESS: Address = address!("0000003111cD8e92337C100F22B7A9dbf8DEE301");
/// Fallback action target used when a session declares no explicit actions.
pub const FALLBACK_TARGET_FLAG: Address = address!("0000000000000000000000000000000000000001");
/// Fallback action selector paired with [`FALLBACK_TARGET_FLAG`].
pub const FALLBACK_TARGET_SELECTOR_FLAG: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Contract addresses the account stack talks to.
///
/// Defaults to the canonical deployments; every field can be overridden
/// through configuration for forks and test networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
	#[serde(default = "default_entry_point")]
	pub entry_point: Address,
	#[serde(default = "default_smart_sessions")]
	pub smart_sessions: Address,
	#[serde(default = "default_ownable_validator")]
	pub ownable_validator: Address,
	#[serde(default = "default_webauthn_validator")]
	pub webauthn_validator: Address,
	#[serde(default = "default_compact")]
	pub compact: Address,
}

impl Default for ContractAddresses {
	fn default() -> Self {
		Self {
			entry_point: ENTRY_POINT_ADDRESS,
			smart_sessions: SMART_SESSIONS_ADDRESS,
			ownable_validator: OWNABLE_VALIDATOR_ADDRESS,
			webauthn_validator: WEBAUTHN_VALIDATOR_ADDRESS,
			compact: COMPACT_ADDRESS,
		}
	}
}

fn default_entry_point() -> Address {
	ENTRY_POINT_ADDRESS
}

fn default_smart_sessions() -> Address {
	SMART_SESSIONS_ADDRESS
}

fn default_ownable_validator() -> Address {
	OWNABLE_VALIDATOR_ADDRESS
}

fn default_webauthn_validator() -> Address {
	WEBAUTHN_VALIDATOR_ADDRESS
}

fn default_compact() -> Address {
	COMPACT_ADDRESS
}

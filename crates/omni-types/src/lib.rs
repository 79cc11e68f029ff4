//! Common types module for omnichain smart accounts.
//!
//! This module defines the data model shared by every crate in the workspace:
//! account configuration, sessions, logical transactions, orchestrator payloads
//! and user operation receipts. It also hosts the pure hashing and encoding
//! layer (EIP-712 helpers, multichain compacts, ERC-7739 nested hashing,
//! ERC-4337 user operations and Smart Session signature packing).

/// Account configuration and owner schemes.
pub mod account;
/// Delivery types for bundler interactions.
pub mod delivery;
/// Encoding errors shared by the hashing layer.
pub mod error;
/// Orchestrator request and response payloads.
pub mod orchestrator;
/// Secure string type for handling sensitive data.
pub mod secret_string;
/// Scoped session grants and permission identifiers.
pub mod session;
/// Standard-specific encoders.
pub mod standards;
/// Logical transactions as requested by callers.
pub mod transaction;
/// Utility functions for hashing and formatting.
pub mod utils;

pub use account::*;
pub use delivery::*;
pub use error::EncodingError;
pub use orchestrator::*;
pub use secret_string::SecretString;
pub use session::*;
pub use standards::{
	compact::{Execution, Mandate, MultiChainCompact, Segment, MULTICHAIN_COMPACT_TYPE},
	erc4337::{PackedUserOperation, UserOperationGasEstimate, ENTRY_POINT_V07},
	erc7739::{AccountDomain, Erc7739Context},
	smart_session::ParsedSessionSignature,
};
pub use transaction::*;
pub use utils::{truncate_id, without_0x_prefix};

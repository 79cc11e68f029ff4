//! Utility functions for hashing and formatting.

pub mod constants;
pub mod eip712;
pub mod formatting;

#[cfg(any(test, feature = "testing"))]
pub mod tests;

pub use constants::ContractAddresses;
pub use eip712::{compute_domain_hash, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE};
pub use formatting::{truncate_id, without_0x_prefix};

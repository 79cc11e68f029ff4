//! Builder for Session

use crate::{
	session::{Session, SessionAction, SessionOwners},
	utils::constants::OWNABLE_VALIDATOR_ADDRESS,
};
use alloy_primitives::{address, Address, B256};

/// Builder for creating `Session` instances.
///
/// Defaults to a single session owner, no explicit actions and permission to
/// co-sign `MultichainCompact` contents.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
	owners: Vec<Address>,
	threshold: u64,
	actions: Vec<SessionAction>,
	allowed_contents: Vec<String>,
	salt: B256,
}

impl Default for SessionBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SessionBuilder {
	pub fn new() -> Self {
		Self {
			owners: vec![address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")],
			threshold: 1,
			actions: Vec::new(),
			allowed_contents: vec!["MultichainCompact".to_string()],
			salt: B256::ZERO,
		}
	}

	pub fn with_owners(mut self, owners: Vec<Address>, threshold: u64) -> Self {
		self.owners = owners;
		self.threshold = threshold;
		self
	}

	pub fn with_action(mut self, action: SessionAction) -> Self {
		self.actions.push(action);
		self
	}

	pub fn with_allowed_contents(mut self, names: Vec<String>) -> Self {
		self.allowed_contents = names;
		self
	}

	pub fn with_salt(mut self, salt: B256) -> Self {
		self.salt = salt;
		self
	}

	pub fn build(self) -> Session {
		Session {
			validator: OWNABLE_VALIDATOR_ADDRESS,
			owners: SessionOwners { accounts: self.owners, threshold: self.threshold },
			actions: self.actions,
			allowed_contents: self.allowed_contents,
			salt: self.salt,
		}
	}
}

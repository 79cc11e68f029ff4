//! ERC-7739 nested typed-data hashing.
//!
//! The account co-signs application contents by wrapping them in a
//! `TypedDataSign` struct that carries the account's own EIP-712 domain.
//! The 0x1901 prefix uses the application domain separator, so a signature
//! for one account cannot be replayed on another.

use crate::{
	error::EncodingError,
	utils::eip712::{compute_final_digest, Eip712AbiEncoder},
};
use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

/// ERC-5267 field bits.
pub const FIELD_NAME: u8 = 0x01;
pub const FIELD_VERSION: u8 = 0x02;
pub const FIELD_CHAIN_ID: u8 = 0x04;
pub const FIELD_VERIFYING_CONTRACT: u8 = 0x08;
pub const FIELD_SALT: u8 = 0x10;

const REQUIRED_FIELDS: u8 = FIELD_NAME | FIELD_VERSION | FIELD_CHAIN_ID | FIELD_VERIFYING_CONTRACT;

/// EIP-712 domain of a smart account, as reported by `eip712Domain()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDomain {
	pub name: String,
	pub version: String,
	/// Kept as a 256-bit integer end-to-end, never narrowed.
	pub chain_id: U256,
	pub verifying_contract: Address,
	pub salt: B256,
}

impl AccountDomain {
	/// Builds a domain from an ERC-5267 response.
	///
	/// Name, version, chain id and verifying contract must all be present.
	/// A salt that is not flagged in `fields` is treated as zero.
	pub fn from_eip5267(
		fields: u8,
		name: String,
		version: String,
		chain_id: U256,
		verifying_contract: Address,
		salt: B256,
	) -> Result<Self, EncodingError> {
		if fields & REQUIRED_FIELDS != REQUIRED_FIELDS {
			return Err(EncodingError::MalformedDomain(format!(
				"fields bitmask 0x{:02x} is missing required entries",
				fields
			)));
		}

		Ok(Self {
			name,
			version,
			chain_id,
			verifying_contract,
			salt: if fields & FIELD_SALT != 0 { salt } else { B256::ZERO },
		})
	}
}

/// Application-side inputs of a nested signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc7739Context {
	pub app_domain_separator: B256,
	pub contents_hash: B256,
	/// Full EIP-712 type string of the contents, supplied verbatim.
	pub contents_type: String,
}

impl Erc7739Context {
	pub fn new(
		app_domain_separator: B256,
		contents_hash: B256,
		contents_type: impl Into<String>,
	) -> Self {
		Self {
			app_domain_separator,
			contents_hash,
			contents_type: contents_type.into(),
		}
	}

	/// Name of the contents struct: everything before the first `(`.
	pub fn contents_name(&self) -> Result<&str, EncodingError> {
		contents_name(&self.contents_type)
	}

	/// `TypedDataSign(...)` type string followed by the contents type.
	pub fn typed_data_sign_type(&self) -> Result<String, EncodingError> {
		let name = self.contents_name()?;
		Ok(format!(
			"TypedDataSign({} contents,string name,string version,uint256 chainId,address verifyingContract,bytes32 salt){}",
			name, self.contents_type
		))
	}

	/// Hash the account's signer signs over.
	pub fn typed_data_sign_hash(&self, domain: &AccountDomain) -> Result<B256, EncodingError> {
		let typehash = keccak256(self.typed_data_sign_type()?.as_bytes());

		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&typehash);
		enc.push_b256(&self.contents_hash);
		enc.push_string(&domain.name);
		enc.push_string(&domain.version);
		enc.push_u256(domain.chain_id);
		enc.push_address(&domain.verifying_contract);
		enc.push_b256(&domain.salt);
		let struct_hash = keccak256(enc.finish());

		Ok(compute_final_digest(&self.app_domain_separator, &struct_hash))
	}
}

/// Extracts and validates the contents name of an EIP-712 type string.
pub fn contents_name(contents_type: &str) -> Result<&str, EncodingError> {
	let malformed = || EncodingError::MalformedContentsType(contents_type.to_string());

	let (name, _) = contents_type.split_once('(').ok_or_else(malformed)?;
	let first = name.chars().next().ok_or_else(malformed)?;
	if first.is_ascii_lowercase() || name.contains(&[',', ' ', ')', '\0'][..]) {
		return Err(malformed());
	}
	Ok(name)
}

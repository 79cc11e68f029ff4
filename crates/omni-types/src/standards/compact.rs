//! Multichain compact hashing.
//!
//! An order bundle is a `MultichainCompact`: one sponsor commitment split into
//! per-chain segments. The struct hash is chain-agnostic and computed once per
//! bundle; each segment's chain then applies its own Compact domain separator.

use crate::{
	error::EncodingError,
	utils::eip712::{
		compute_domain_hash, compute_final_digest, hash_struct_array, hash_uint_pairs,
		Eip712AbiEncoder,
	},
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// EIP-712 domain name of The Compact.
pub const COMPACT_DOMAIN_NAME: &str = "The Compact";
/// EIP-712 domain version of The Compact.
pub const COMPACT_DOMAIN_VERSION: &str = "1";

macro_rules! execution_type {
	() => {
		"Execution(address to,uint256 value,bytes data)"
	};
}

macro_rules! mandate_type {
	() => {
		"Mandate(address recipient,uint256[2][] tokenOut,uint256 destinationChainId,uint256 fillDeadline,Execution[] destinationOps,bytes32 qualifier)"
	};
}

macro_rules! segment_type {
	() => {
		"Segment(address arbiter,uint256 chainId,uint256[2][] idsAndAmounts,Mandate mandate)"
	};
}

/// Type string of a destination execution.
pub const EXECUTION_TYPE: &str = execution_type!();
/// Type string of a mandate, with its referenced types appended.
pub const MANDATE_TYPE: &str = concat!(mandate_type!(), execution_type!());
/// Type string of a segment, with its referenced types appended.
pub const SEGMENT_TYPE: &str = concat!(segment_type!(), execution_type!(), mandate_type!());
/// Full type string of the multichain compact.
///
/// This is also the ERC-7739 contents type the account co-signs.
pub const MULTICHAIN_COMPACT_TYPE: &str = concat!(
	"MultichainCompact(address sponsor,uint256 nonce,uint256 expires,Segment[] segments)",
	execution_type!(),
	mandate_type!(),
	segment_type!()
);

/// A call executed on the destination chain once the intent is filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
	pub to: Address,
	pub value: U256,
	pub data: Bytes,
}

impl Execution {
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(EXECUTION_TYPE.as_bytes()));
		enc.push_address(&self.to);
		enc.push_u256(self.value);
		enc.push_bytes(&self.data);
		keccak256(enc.finish())
	}
}

/// Delivery terms of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mandate {
	pub recipient: Address,
	/// `[tokenId, amount]` pairs delivered to the recipient.
	pub token_out: Vec<[U256; 2]>,
	pub destination_chain_id: U256,
	pub fill_deadline: U256,
	pub destination_ops: Vec<Execution>,
	pub qualifier: B256,
}

impl Mandate {
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(MANDATE_TYPE.as_bytes()));
		enc.push_address(&self.recipient);
		enc.push_b256(&hash_uint_pairs(&self.token_out));
		enc.push_u256(self.destination_chain_id);
		enc.push_u256(self.fill_deadline);
		enc.push_b256(&hash_struct_array(
			self.destination_ops.iter().map(Execution::struct_hash),
		));
		enc.push_b256(&self.qualifier);
		keccak256(enc.finish())
	}
}

/// Escrow terms of one chain in the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
	pub arbiter: Address,
	pub chain_id: U256,
	/// `[lockId, amount]` pairs escrowed on this chain.
	pub ids_and_amounts: Vec<[U256; 2]>,
	pub mandate: Mandate,
}

impl Segment {
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(SEGMENT_TYPE.as_bytes()));
		enc.push_address(&self.arbiter);
		enc.push_u256(self.chain_id);
		enc.push_b256(&hash_uint_pairs(&self.ids_and_amounts));
		enc.push_b256(&self.mandate.struct_hash());
		keccak256(enc.finish())
	}
}

/// The canonical order bundle every chain agrees on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChainCompact {
	pub sponsor: Address,
	pub nonce: U256,
	pub expires: U256,
	pub segments: Vec<Segment>,
}

impl MultiChainCompact {
	/// Struct hash without any domain separator applied.
	pub fn struct_hash(&self) -> Result<B256, EncodingError> {
		if self.segments.is_empty() {
			return Err(EncodingError::EmptyBundle);
		}

		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(MULTICHAIN_COMPACT_TYPE.as_bytes()));
		enc.push_address(&self.sponsor);
		enc.push_u256(self.nonce);
		enc.push_u256(self.expires);
		enc.push_b256(&hash_struct_array(
			self.segments.iter().map(Segment::struct_hash),
		));
		Ok(keccak256(enc.finish()))
	}

	/// Chain of the first segment, where the sponsor signature is verified.
	pub fn origin_chain_id(&self) -> Option<U256> {
		self.segments.first().map(|segment| segment.chain_id)
	}

	/// Per-segment `(chainId, digest)` pairs, all derived from one struct hash.
	pub fn chain_digests(&self, compact: &Address) -> Result<Vec<(U256, B256)>, EncodingError> {
		let struct_hash = self.struct_hash()?;
		Ok(self
			.segments
			.iter()
			.map(|segment| {
				let domain = compact_domain_separator(segment.chain_id, compact);
				(segment.chain_id, compute_final_digest(&domain, &struct_hash))
			})
			.collect())
	}
}

/// Domain separator of The Compact deployed at `compact` on `chain_id`.
pub fn compact_domain_separator(chain_id: U256, compact: &Address) -> B256 {
	compute_domain_hash(COMPACT_DOMAIN_NAME, COMPACT_DOMAIN_VERSION, chain_id, compact)
}

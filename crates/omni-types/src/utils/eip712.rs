//! Generic EIP-712 utilities shared across the workspace.
//!
//! These helpers provide:
//! - Domain hash computation for `name, version, chainId, verifyingContract` domains
//! - Final digest computation (0x1901 || domainHash || structHash)
//! - A minimal ABI encoder for the field types used by the struct hashes

use alloy_primitives::{keccak256, Address, B256, U256};

/// Domain type used by application domains such as the Compact.
pub const DOMAIN_TYPE: &str =
	"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Compute EIP-712 domain hash
/// (keccak256(abi.encode(typeHash, nameHash, versionHash, chainId, verifyingContract))).
pub fn compute_domain_hash(
	name: &str,
	version: &str,
	chain_id: U256,
	verifying_contract: &Address,
) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&keccak256(DOMAIN_TYPE.as_bytes()));
	enc.push_string(name);
	enc.push_string(version);
	enc.push_u256(chain_id);
	enc.push_address(verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Minimal ABI encoder for EIP-712 `encodeData`.
///
/// Dynamic values (`string`, `bytes`) are pre-hashed before being appended,
/// everything else is appended as a single 32-byte word.
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Default for Eip712AbiEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	/// Appends `keccak256(value)` for a `string` field.
	pub fn push_string(&mut self, value: &str) {
		self.push_b256(&keccak256(value.as_bytes()));
	}

	/// Appends `keccak256(value)` for a `bytes` field.
	pub fn push_bytes(&mut self, value: &[u8]) {
		self.push_b256(&keccak256(value));
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}

/// Hashes a list of struct hashes as an EIP-712 array (`keccak256(concat(hashes))`).
pub fn hash_struct_array(hashes: impl IntoIterator<Item = B256>) -> B256 {
	let mut buf = Vec::new();
	for hash in hashes {
		buf.extend_from_slice(hash.as_slice());
	}
	keccak256(buf)
}

/// Hashes a `uint256[2][]` value as `keccak256(abi.encodePacked(pairs))`.
pub fn hash_uint_pairs(pairs: &[[U256; 2]]) -> B256 {
	let mut buf = Vec::with_capacity(pairs.len() * 64);
	for [first, second] in pairs {
		buf.extend_from_slice(&first.to_be_bytes::<32>());
		buf.extend_from_slice(&second.to_be_bytes::<32>());
	}
	keccak256(buf)
}

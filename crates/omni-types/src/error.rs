//! Errors raised by the pure hashing and encoding layer.
//!
//! Every variant is deterministic: the same input always fails the same way,
//! and nothing is ever silently truncated.

use thiserror::Error;

/// Errors that can occur while hashing or packing structured data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
	/// The ERC-7739 contents type does not fit the 16-bit length suffix.
	#[error("Contents type descriptor too long: {0} bytes (max 65535)")]
	DescriptorTooLong(usize),
	/// The contents type does not start with a struct name followed by `(`.
	#[error("Malformed contents type: {0}")]
	MalformedContentsType(String),
	/// A signature with an unusable length was supplied.
	#[error("Invalid signature length: {0}")]
	InvalidSignatureLength(usize),
	/// The EIP-712 domain returned by an account is incomplete.
	#[error("Malformed EIP-712 domain: {0}")]
	MalformedDomain(String),
	/// An order bundle without segments cannot be hashed.
	#[error("Order bundle has no segments")]
	EmptyBundle,
	/// An execution batch without calls cannot be encoded.
	#[error("No calls to execute")]
	EmptyExecution,
	/// ABI decoding of a contract response failed.
	#[error("Decode error: {0}")]
	Decode(String),
	/// A gas value does not fit its 128-bit slot in the packed user operation.
	#[error("{field} does not fit in 128 bits: {value}")]
	GasFieldOverflow { field: String, value: String },
	/// A packed payload is shorter than its fixed-size fields.
	#[error("Payload too short: expected at least {expected} bytes, got {actual}")]
	PayloadTooShort { expected: usize, actual: usize },
}

//! Builder for MultiChainCompact
//!
//! Provides a fluent API for constructing order bundles with one segment per
//! chain and deterministic field values.

use crate::standards::compact::{Execution, Mandate, MultiChainCompact, Segment};
use alloy_primitives::{address, Address, Bytes, B256, U256};

/// Builder for creating `MultiChainCompact` instances with a fluent API.
///
/// # Examples
///
/// ```text
/// use omni_types::utils::tests::builders::MultiChainCompactBuilder;
///
/// let bundle = MultiChainCompactBuilder::new()
///     .with_segment(10)
///     .with_segment(8453)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct MultiChainCompactBuilder {
	sponsor: Address,
	nonce: U256,
	expires: U256,
	target_chain_id: U256,
	segments: Vec<Segment>,
}

impl Default for MultiChainCompactBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl MultiChainCompactBuilder {
	/// Creates a new builder with no segments.
	pub fn new() -> Self {
		Self {
			sponsor: address!("5555555555555555555555555555555555555555"),
			nonce: U256::from(1),
			expires: U256::from(1_900_000_000u64),
			target_chain_id: U256::from(8453),
			segments: Vec::new(),
		}
	}

	pub fn with_sponsor(mut self, sponsor: Address) -> Self {
		self.sponsor = sponsor;
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = U256::from(nonce);
		self
	}

	/// Sets the destination chain recorded in every segment mandate added afterwards.
	pub fn with_target_chain(mut self, chain_id: u64) -> Self {
		self.target_chain_id = U256::from(chain_id);
		self
	}

	/// Appends a segment escrowing a fixed amount on `chain_id`.
	pub fn with_segment(mut self, chain_id: u64) -> Self {
		let index = self.segments.len() as u64;
		self.segments.push(Segment {
			arbiter: address!("6666666666666666666666666666666666666666"),
			chain_id: U256::from(chain_id),
			ids_and_amounts: vec![[U256::from(1000 + index), U256::from(1_000_000)]],
			mandate: Mandate {
				recipient: self.sponsor,
				token_out: vec![[U256::from(2000), U256::from(990_000)]],
				destination_chain_id: self.target_chain_id,
				fill_deadline: self.expires,
				destination_ops: vec![Execution {
					to: address!("7777777777777777777777777777777777777777"),
					value: U256::ZERO,
					data: Bytes::from_static(&[0xa9, 0x05, 0x9c, 0xbb]),
				}],
				qualifier: B256::ZERO,
			},
		});
		self
	}

	pub fn build(self) -> MultiChainCompact {
		MultiChainCompact {
			sponsor: self.sponsor,
			nonce: self.nonce,
			expires: self.expires,
			segments: self.segments,
		}
	}
}

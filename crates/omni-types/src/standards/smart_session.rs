//! Smart Sessions signature packing.
//!
//! Layouts produced here:
//!
//! ```text
//! ERC-7739 payload: signature ‖ appDomainSeparator ‖ contentsHash ‖ contentsType ‖ uint16be(len)
//! session payload:  permissionId ‖ ERC-7739 payload
//! USE mode:         0x00 ‖ permissionId ‖ signature
//! ```

use crate::{error::EncodingError, session::Session, standards::erc7739::Erc7739Context};
use alloy_primitives::{Bytes, B256};

/// Smart Sessions mode byte for using an already enabled session.
pub const SMART_SESSION_MODE_USE: u8 = 0x00;

const WORD: usize = 32;

/// Packs a raw signature with the ERC-7739 context that produced its hash.
pub fn pack_erc7739_signature(
	signature: &[u8],
	context: &Erc7739Context,
) -> Result<Bytes, EncodingError> {
	if signature.is_empty() {
		return Err(EncodingError::InvalidSignatureLength(0));
	}
	let descriptor = context.contents_type.as_bytes();
	let descriptor_len = u16::try_from(descriptor.len())
		.map_err(|_| EncodingError::DescriptorTooLong(descriptor.len()))?;

	let mut out = Vec::with_capacity(signature.len() + 2 * WORD + descriptor.len() + 2);
	out.extend_from_slice(signature);
	out.extend_from_slice(context.app_domain_separator.as_slice());
	out.extend_from_slice(context.contents_hash.as_slice());
	out.extend_from_slice(descriptor);
	out.extend_from_slice(&descriptor_len.to_be_bytes());
	Ok(out.into())
}

/// Prefixes an ERC-7739 payload with the session's permission id.
pub fn pack_session_signature(permission_id: B256, erc7739_signature: &[u8]) -> Bytes {
	let mut out = Vec::with_capacity(WORD + erc7739_signature.len());
	out.extend_from_slice(permission_id.as_slice());
	out.extend_from_slice(erc7739_signature);
	out.into()
}

/// Final payload for a session co-signing ERC-7739 contents.
///
/// The permission id is recomputed from `session` on every call.
pub fn encode_session_signature(
	signature: &[u8],
	context: &Erc7739Context,
	session: &Session,
) -> Result<Bytes, EncodingError> {
	let inner = pack_erc7739_signature(signature, context)?;
	Ok(pack_session_signature(session.permission_id(), &inner))
}

/// User-operation signature for an enabled session (USE mode).
pub fn encode_smart_session_signature(permission_id: B256, signature: &[u8]) -> Bytes {
	let mut out = Vec::with_capacity(1 + WORD + signature.len());
	out.push(SMART_SESSION_MODE_USE);
	out.extend_from_slice(permission_id.as_slice());
	out.extend_from_slice(signature);
	out.into()
}

/// Fields recovered from a session payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSessionSignature {
	pub permission_id: B256,
	pub signature: Bytes,
	pub context: Erc7739Context,
}

/// Parses a session payload from its tail, using the embedded length.
pub fn parse_session_signature(payload: &[u8]) -> Result<ParsedSessionSignature, EncodingError> {
	let fixed = WORD + 2 * WORD + 2;
	if payload.len() < fixed {
		return Err(EncodingError::PayloadTooShort { expected: fixed, actual: payload.len() });
	}

	let (body, len_bytes) = payload.split_at(payload.len() - 2);
	let descriptor_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
	if payload.len() < fixed + descriptor_len {
		return Err(EncodingError::PayloadTooShort {
			expected: fixed + descriptor_len,
			actual: payload.len(),
		});
	}

	let (body, descriptor) = body.split_at(body.len() - descriptor_len);
	let contents_type = std::str::from_utf8(descriptor)
		.map_err(|e| EncodingError::Decode(format!("contents type is not UTF-8: {}", e)))?;
	let (body, contents_hash) = body.split_at(body.len() - WORD);
	let (body, app_domain_separator) = body.split_at(body.len() - WORD);
	let (permission_id, signature) = body.split_at(WORD);

	Ok(ParsedSessionSignature {
		permission_id: B256::from_slice(permission_id),
		signature: Bytes::copy_from_slice(signature),
		context: Erc7739Context::new(
			B256::from_slice(app_domain_separator),
			B256::from_slice(contents_hash),
			contents_type,
		),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		standards::compact::MULTICHAIN_COMPACT_TYPE, utils::tests::builders::SessionBuilder,
	};

	fn context_with(contents_type: String) -> Erc7739Context {
		Erc7739Context::new(B256::repeat_byte(0x0a), B256::repeat_byte(0x0b), contents_type)
	}

	#[test]
	fn test_layout_is_bit_exact() {
		let session = SessionBuilder::new().build();
		let signature = [0x11u8; 65];
		let ctx = context_with(MULTICHAIN_COMPACT_TYPE.to_string());

		let payload = encode_session_signature(&signature, &ctx, &session).unwrap();

		let descriptor = MULTICHAIN_COMPACT_TYPE.as_bytes();
		assert_eq!(payload.len(), 32 + 65 + 32 + 32 + descriptor.len() + 2);
		assert_eq!(&payload[..32], session.permission_id().as_slice());
		assert_eq!(&payload[32..97], &signature);
		assert_eq!(&payload[97..129], ctx.app_domain_separator.as_slice());
		assert_eq!(&payload[129..161], ctx.contents_hash.as_slice());
		assert_eq!(&payload[161..161 + descriptor.len()], descriptor);
		assert_eq!(
			&payload[payload.len() - 2..],
			&(descriptor.len() as u16).to_be_bytes()
		);
	}

	#[test]
	fn test_round_trip_for_boundary_lengths() {
		let permission_id = B256::repeat_byte(0x42);
		let signature = [0x22u8; 65];

		for len in [0usize, 1, 255, 65535] {
			let ctx = context_with("A".repeat(len));
			let inner = pack_erc7739_signature(&signature, &ctx).unwrap();
			let payload = pack_session_signature(permission_id, &inner);

			let parsed = parse_session_signature(&payload).unwrap();
			assert_eq!(parsed.permission_id, permission_id);
			assert_eq!(parsed.signature.as_ref(), &signature);
			assert_eq!(parsed.context, ctx, "length {}", len);
		}
	}

	#[test]
	fn test_descriptor_over_u16_is_rejected() {
		let ctx = context_with("A".repeat(65536));
		assert_eq!(
			pack_erc7739_signature(&[0x01; 65], &ctx),
			Err(EncodingError::DescriptorTooLong(65536))
		);
	}

	#[test]
	fn test_length_counts_utf8_bytes() {
		let ctx = context_with("Ä".to_string());
		let payload = pack_erc7739_signature(&[0x01; 65], &ctx).unwrap();
		assert_eq!(&payload[payload.len() - 2..], &[0x00, 0x02]);
	}

	#[test]
	fn test_empty_signature_is_rejected() {
		let ctx = context_with(MULTICHAIN_COMPACT_TYPE.to_string());
		assert_eq!(
			pack_erc7739_signature(&[], &ctx),
			Err(EncodingError::InvalidSignatureLength(0))
		);
	}

	#[test]
	fn test_parse_rejects_truncated_payload() {
		assert!(matches!(
			parse_session_signature(&[0u8; 10]),
			Err(EncodingError::PayloadTooShort { .. })
		));

		// Claims a descriptor longer than the payload
		let mut payload = vec![0u8; 98];
		payload.extend_from_slice(&100u16.to_be_bytes());
		assert!(matches!(
			parse_session_signature(&payload),
			Err(EncodingError::PayloadTooShort { .. })
		));
	}

	#[test]
	fn test_use_mode_encoding() {
		let permission_id = B256::repeat_byte(0x42);
		let encoded = encode_smart_session_signature(permission_id, &[0x33; 65]);
		assert_eq!(encoded[0], SMART_SESSION_MODE_USE);
		assert_eq!(&encoded[1..33], permission_id.as_slice());
		assert_eq!(encoded.len(), 1 + 32 + 65);
	}
}

//! Immutable stage outputs of the transaction pipeline.
//!
//! Each artifact is serialisable so callers can persist it and resume later.

use crate::CoreError;
use alloy_primitives::{Address, Bytes, B256, U256};
use omni_account::OwnerSignature;
use omni_types::{
	standards::smart_session::pack_erc7739_signature, BundleResult, Erc7739Context, OrderPath,
	PackedUserOperation, Transaction, UserOperationReceipt,
};
use serde::{Deserialize, Serialize};

/// Execution path chosen at preparation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "camelCase")]
pub enum PreparedPath {
	/// One user operation on the target chain, carrying a placeholder signature.
	#[serde(rename_all = "camelCase")]
	Direct { chain_id: u64, user_operation: PackedUserOperation },
	/// An orchestrated intent; `order_path[0]` holds the canonical bundle.
	#[serde(rename_all = "camelCase")]
	Intent { source_chain: u64, order_path: OrderPath },
}

/// Output of the prepare stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
	pub transaction: Transaction,
	pub path: PreparedPath,
}

impl PreparedTransaction {
	pub fn is_direct(&self) -> bool {
		matches!(self.path, PreparedPath::Direct { .. })
	}

	/// Chain whose account verifies the signature.
	pub fn signing_chain(&self) -> u64 {
		match &self.path {
			PreparedPath::Direct { chain_id, .. } => *chain_id,
			PreparedPath::Intent { source_chain, .. } => *source_chain,
		}
	}
}

/// Signature material bound to a prepared transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionSignature {
	/// Owner signatures over `digest`. Intents also carry the nested-hash context.
	#[serde(rename_all = "camelCase")]
	Owner {
		digest: B256,
		signature: OwnerSignature,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		context: Option<Erc7739Context>,
	},
	/// A fully packed session payload.
	#[serde(rename_all = "camelCase")]
	Session { permission_id: B256, payload: Bytes },
}

/// Output of the sign stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
	pub prepared: PreparedTransaction,
	pub signature: TransactionSignature,
}

impl SignedTransaction {
	/// True once the signature can be submitted.
	pub fn is_complete(&self) -> bool {
		match &self.signature {
			TransactionSignature::Owner { signature, .. } => signature.is_complete(),
			TransactionSignature::Session { .. } => true,
		}
	}

	/// Adds a co-signer's signature over the same digest.
	///
	/// The signature must recover to one of `owners`.
	pub fn add_owner_signature(
		&mut self,
		owners: &[Address],
		signature: Bytes,
	) -> Result<Address, CoreError> {
		match &mut self.signature {
			TransactionSignature::Owner { digest, signature: collected, .. } => {
				Ok(collected.insert_verified(owners, digest, signature)?)
			},
			TransactionSignature::Session { .. } => Err(CoreError::Configuration(
				"session-signed transactions take no owner signatures".into(),
			)),
		}
	}

	/// Bytes the account verifies: owner signatures in ascending order (wrapped
	/// for intents), or the session payload.
	pub fn final_signature(&self) -> Result<Bytes, CoreError> {
		match &self.signature {
			TransactionSignature::Owner { signature, context, .. } => {
				if !signature.is_complete() {
					let required = match signature {
						OwnerSignature::Ecdsa { threshold, .. } => *threshold,
						OwnerSignature::Passkey { .. } => 1,
					};
					return Err(CoreError::IncompleteSignatures {
						collected: signature.collected(),
						required,
					});
				}
				let encoded = signature.encode();
				match context {
					Some(context) => Ok(pack_erc7739_signature(&encoded, context)?),
					None => Ok(encoded),
				}
			},
			TransactionSignature::Session { payload, .. } => Ok(payload.clone()),
		}
	}
}

/// Output of the submit stage: exactly one of an operation hash or a bundle id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionResult {
	#[serde(rename_all = "camelCase")]
	UserOperation { chain_id: u64, hash: B256 },
	Bundle { id: U256 },
}

/// Terminal observation of the wait stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
	UserOperation(UserOperationReceipt),
	Bundle(BundleResult),
}

/// Any persisted stage output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "artifact", rename_all = "camelCase")]
pub enum PipelineArtifact {
	Prepared(PreparedTransaction),
	Signed(SignedTransaction),
	Submitted(TransactionResult),
}

impl From<PreparedTransaction> for PipelineArtifact {
	fn from(prepared: PreparedTransaction) -> Self {
		Self::Prepared(prepared)
	}
}

impl From<SignedTransaction> for PipelineArtifact {
	fn from(signed: SignedTransaction) -> Self {
		Self::Signed(signed)
	}
}

impl From<TransactionResult> for PipelineArtifact {
	fn from(result: TransactionResult) -> Self {
		Self::Submitted(result)
	}
}

//! Transaction pipeline: prepare, sign, submit, wait.
//!
//! Each stage consumes the previous stage's artifact and produces the next.
//! Direct transactions become one user operation sent to the bundler;
//! everything else becomes an intent posted to the orchestrator.

mod artifacts;

pub use artifacts::{
	ExecutionOutcome, PipelineArtifact, PreparedPath, PreparedTransaction, SignedTransaction,
	TransactionResult, TransactionSignature,
};

use crate::{
	context::AccountContext,
	operations::build_user_operation,
	polling::{poll_until, Poll},
	session::SessionManager,
	CoreError,
};
use alloy_primitives::{Bytes, U256};
use omni_orchestrator::OrchestratorError;
use omni_types::{
	standards::{
		compact::compact_domain_separator,
		erc4337::DUMMY_ECDSA_SIGNATURE,
		smart_session::{encode_session_signature, encode_smart_session_signature},
	},
	truncate_id, AccountAccess, BundleStatus, Erc7739Context, Execution, MetaIntent, Session,
	SignedOrderBundle, TokenTransfer, Transaction, MULTICHAIN_COMPACT_TYPE,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Drives transactions of one account through the four stages.
pub struct TransactionPipeline {
	ctx: Arc<AccountContext>,
	sessions: Arc<SessionManager>,
}

impl TransactionPipeline {
	pub fn new(ctx: Arc<AccountContext>, sessions: Arc<SessionManager>) -> Self {
		Self { ctx, sessions }
	}

	/// Chooses the execution path and gathers what signing needs.
	#[instrument(skip_all, fields(target_chain = transaction.target_chain))]
	pub async fn prepare(
		&self,
		transaction: Transaction,
	) -> Result<PreparedTransaction, CoreError> {
		if transaction.calls.is_empty() && transaction.token_requests.is_empty() {
			return Err(CoreError::Configuration("transaction has nothing to do".into()));
		}
		if let Some(session) = &transaction.session {
			self.check_session(session, !transaction.is_direct())?;
		}

		let path = if transaction.is_direct() {
			self.prepare_direct(&transaction).await?
		} else {
			self.prepare_intent(&transaction).await?
		};

		let kind = if matches!(path, PreparedPath::Direct { .. }) { "direct" } else { "intent" };
		info!(path = kind, "Transaction prepared");
		Ok(PreparedTransaction { transaction, path })
	}

	async fn prepare_direct(&self, transaction: &Transaction) -> Result<PreparedPath, CoreError> {
		let chain_id = transaction.target_chain;
		self.ctx.ensure_chain(chain_id)?;

		let contracts = &self.ctx.config.contracts;
		let (validator, dummy_signature) = match &transaction.session {
			Some(session) => {
				let threshold = usize::try_from(session.owners.threshold).unwrap_or(1);
				let placeholder = DUMMY_ECDSA_SIGNATURE.repeat(threshold);
				(
					contracts.smart_sessions,
					encode_smart_session_signature(session.permission_id(), &placeholder),
				)
			},
			None => (self.ctx.owners.validator(contracts), self.ctx.owners.dummy_signature()),
		};

		let user_operation = build_user_operation(
			&self.ctx,
			chain_id,
			&transaction.calls,
			validator,
			dummy_signature,
		)
		.await?;
		Ok(PreparedPath::Direct { chain_id, user_operation })
	}

	async fn prepare_intent(&self, transaction: &Transaction) -> Result<PreparedPath, CoreError> {
		if let Some(source_chain) = transaction.source_chain {
			self.ctx.ensure_chain(source_chain)?;
		}

		let intent = MetaIntent {
			target_chain_id: transaction.target_chain,
			token_transfers: transaction
				.token_requests
				.iter()
				.map(|request| TokenTransfer { token_address: request.address, amount: request.amount })
				.collect(),
			target_account: self.ctx.address(),
			target_executions: transaction
				.calls
				.iter()
				.map(|call| Execution { to: call.to, value: call.value, data: call.data.clone() })
				.collect(),
			account_access: transaction
				.source_chain
				.map(|chain_id| AccountAccess { chain_ids: vec![chain_id], tokens: vec![] }),
		};

		let order_path = self
			.ctx
			.orchestrator
			.get_order_path(&intent, self.ctx.address())
			.await?;
		let Some(first) = order_path.first() else {
			return Err(OrchestratorError::InvalidResponse("empty order path".into()).into());
		};

		let source_chain = match transaction.source_chain {
			Some(chain_id) => chain_id,
			None => {
				let origin = first.order_bundle.origin_chain_id().ok_or(
					CoreError::Encoding(omni_types::EncodingError::EmptyBundle),
				)?;
				u64::try_from(origin).map_err(|_| {
					CoreError::Configuration(format!("origin chain id {} does not fit u64", origin))
				})?
			},
		};
		self.ctx.ensure_chain(source_chain)?;

		debug!(
			source_chain = source_chain,
			segments = first.order_bundle.segments.len(),
			candidates = order_path.len(),
			"Received order path"
		);
		Ok(PreparedPath::Intent { source_chain, order_path })
	}

	/// Local checks for a session-signed transaction, before any network call.
	fn check_session(&self, session: &Session, needs_contents: bool) -> Result<(), CoreError> {
		self.ctx.session_signers_for(session)?;
		if needs_contents && !session.allows_contents(MULTICHAIN_COMPACT_TYPE) {
			return Err(CoreError::Configuration(format!(
				"session {} may not sign MultichainCompact contents",
				session.permission_id()
			)));
		}
		Ok(())
	}

	/// Signs with the owners, or with the session after making sure it is installed.
	///
	/// Threshold accounts may return an incomplete artifact; co-signers add
	/// their signatures with [`SignedTransaction::add_owner_signature`].
	#[instrument(skip_all, fields(chain_id = prepared.signing_chain()))]
	pub async fn sign(&self, prepared: PreparedTransaction) -> Result<SignedTransaction, CoreError> {
		if let Some(session) = &prepared.transaction.session {
			self.check_session(session, !prepared.is_direct())?;
		}

		let signature = match (&prepared.path, &prepared.transaction.session) {
			(PreparedPath::Direct { chain_id, user_operation }, None) => {
				let digest = user_operation
					.hash(&self.ctx.config.contracts.entry_point, U256::from(*chain_id))?;
				let signature = self.ctx.owners.produce_signature(&digest).await?;
				TransactionSignature::Owner { digest, signature, context: None }
			},
			(PreparedPath::Direct { chain_id, user_operation }, Some(session)) => {
				self.sessions.ensure_installed(*chain_id, session).await?;
				let digest = user_operation
					.hash(&self.ctx.config.contracts.entry_point, U256::from(*chain_id))?;
				let raw = self.ctx.sign_as_session(session, &digest).await?;
				let permission_id = session.permission_id();
				TransactionSignature::Session {
					permission_id,
					payload: encode_smart_session_signature(permission_id, &raw),
				}
			},
			(PreparedPath::Intent { source_chain, order_path }, session) => {
				let bundle = order_path
					.first()
					.map(|entry| &entry.order_bundle)
					.ok_or(CoreError::Encoding(omni_types::EncodingError::EmptyBundle))?;
				let context = Erc7739Context::new(
					compact_domain_separator(
						U256::from(*source_chain),
						&self.ctx.config.contracts.compact,
					),
					bundle.struct_hash()?,
					MULTICHAIN_COMPACT_TYPE,
				);

				if let Some(session) = session {
					self.sessions.ensure_installed(*source_chain, session).await?;
				}
				let domain = self
					.ctx
					.delivery
					.account_domain(*source_chain, self.ctx.address())
					.await?;
				let digest = context.typed_data_sign_hash(&domain)?;

				match session {
					Some(session) => {
						let raw = self.ctx.sign_as_session(session, &digest).await?;
						TransactionSignature::Session {
							permission_id: session.permission_id(),
							payload: encode_session_signature(&raw, &context, session)?,
						}
					},
					None => {
						let signature = self.ctx.owners.produce_signature(&digest).await?;
						TransactionSignature::Owner { digest, signature, context: Some(context) }
					},
				}
			},
		};

		let signed = SignedTransaction { prepared, signature };
		info!(complete = signed.is_complete(), "Transaction signed");
		Ok(signed)
	}

	/// Sends a signed transaction to the bundler or the orchestrator.
	///
	/// Once this returns, the operation can no longer be cancelled.
	#[instrument(skip_all, fields(chain_id = signed.prepared.signing_chain()))]
	pub async fn submit(&self, signed: &SignedTransaction) -> Result<TransactionResult, CoreError> {
		let signature = signed.final_signature()?;

		match &signed.prepared.path {
			PreparedPath::Direct { chain_id, user_operation } => {
				let mut user_operation = user_operation.clone();
				user_operation.signature = signature;
				let hash = self
					.ctx
					.delivery
					.send_user_operation(
						*chain_id,
						&user_operation,
						self.ctx.config.contracts.entry_point,
					)
					.await
					.inspect_err(|e| error!(error = %e, "Bundler rejected user operation"))?;

				info!(user_op_hash = %truncate_id(&hash.to_string()), "User operation submitted");
				Ok(TransactionResult::UserOperation { chain_id: *chain_id, hash })
			},
			PreparedPath::Intent { order_path, .. } => {
				let bundle = order_path
					.first()
					.map(|entry| entry.order_bundle.clone())
					.ok_or(CoreError::Encoding(omni_types::EncodingError::EmptyBundle))?;
				let signed_bundle = signed_order_bundle(bundle, signature);
				let submission = self
					.ctx
					.orchestrator
					.post_signed_order_bundle(&signed_bundle)
					.await
					.inspect_err(|e| error!(error = %e, "Orchestrator rejected bundle"))?;

				info!(bundle_id = %submission.bundle_id, "Bundle submitted");
				Ok(TransactionResult::Bundle { id: submission.bundle_id })
			},
		}
	}

	/// Prepare, sign and submit in one call.
	pub async fn send(&self, transaction: Transaction) -> Result<TransactionResult, CoreError> {
		let prepared = self.prepare(transaction).await?;
		let signed = self.sign(prepared).await?;
		self.submit(&signed).await
	}

	/// Submits a persisted artifact, which must have been signed.
	pub async fn submit_artifact(
		&self,
		artifact: &PipelineArtifact,
	) -> Result<TransactionResult, CoreError> {
		match artifact {
			PipelineArtifact::Prepared(_) => Err(CoreError::NotSigned),
			PipelineArtifact::Signed(signed) => self.submit(signed).await,
			PipelineArtifact::Submitted(result) => Ok(result.clone()),
		}
	}

	/// Continues from any persisted artifact up to submission.
	pub async fn resume(&self, artifact: PipelineArtifact) -> Result<TransactionResult, CoreError> {
		match artifact {
			PipelineArtifact::Prepared(prepared) => {
				let signed = self.sign(prepared).await?;
				self.submit(&signed).await
			},
			PipelineArtifact::Signed(signed) => self.submit(&signed).await,
			PipelineArtifact::Submitted(result) => Ok(result),
		}
	}

	/// Polls until the submitted transaction reaches a terminal state.
	///
	/// With `accept_preconfirmations`, a preconfirmed bundle returns early.
	#[instrument(skip_all)]
	pub async fn wait(
		&self,
		result: &TransactionResult,
		accept_preconfirmations: bool,
	) -> Result<ExecutionOutcome, CoreError> {
		match result {
			TransactionResult::UserOperation { chain_id, hash } => {
				let (chain_id, hash) = (*chain_id, *hash);
				let delivery = &self.ctx.delivery;
				let receipt = poll_until(&self.ctx.retry, "user operation receipt", || async move {
					let receipt = delivery.get_user_operation_receipt(chain_id, hash).await?;
					Ok::<_, CoreError>(match receipt {
						Some(receipt) => Poll::Ready(receipt),
						None => Poll::Pending,
					})
				})
				.await?;

				if !receipt.success {
					error!(user_op_hash = %truncate_id(&hash.to_string()), "User operation reverted");
					return Err(CoreError::OperationReverted { hash, reason: receipt.reason });
				}
				info!(
					block_number = %receipt.receipt.block_number,
					"User operation included"
				);
				Ok(ExecutionOutcome::UserOperation(receipt))
			},
			TransactionResult::Bundle { id } => {
				let id = *id;
				let orchestrator = &self.ctx.orchestrator;
				let bundle = poll_until(&self.ctx.retry, "bundle status", || async move {
					let bundle = orchestrator.get_bundle_status(id).await?;
					let done = bundle.status.is_terminal()
						|| (accept_preconfirmations && bundle.status == BundleStatus::Preconfirmed);
					debug!(status = %bundle.status, "Polled bundle status");
					Ok::<_, CoreError>(if done { Poll::Ready(bundle) } else { Poll::Pending })
				})
				.await?;

				match bundle.status {
					BundleStatus::Expired | BundleStatus::Failed => {
						error!(bundle_id = %id, status = %bundle.status, "Bundle did not fill");
						Err(CoreError::BundleFailed { id, status: bundle.status })
					},
					_ => {
						info!(bundle_id = %id, status = %bundle.status, "Bundle settled");
						Ok(ExecutionOutcome::Bundle(bundle))
					},
				}
			},
		}
	}
}

/// Every segment shares one struct hash, so one signature serves all origin
/// chains and the target.
fn signed_order_bundle(
	bundle: omni_types::MultiChainCompact,
	signature: Bytes,
) -> SignedOrderBundle {
	SignedOrderBundle {
		origin_signatures: vec![signature.clone(); bundle.segments.len()],
		target_signature: signature,
		bundle,
	}
}

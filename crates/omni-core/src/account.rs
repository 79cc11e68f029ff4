//! The account facade callers hold.

use crate::{
	context::AccountContext,
	pipeline::{
		ExecutionOutcome, PipelineArtifact, PreparedTransaction, SignedTransaction,
		TransactionPipeline, TransactionResult,
	},
	session::{InstallOutcome, SessionManager},
	CoreError,
};
use alloy_primitives::{Address, B256};
use omni_types::{Session, Transaction};
use std::sync::Arc;

/// A smart account with its owners, sessions and transaction pipeline.
pub struct SmartAccount {
	ctx: Arc<AccountContext>,
	sessions: Arc<SessionManager>,
	pipeline: TransactionPipeline,
}

impl SmartAccount {
	pub fn new(ctx: AccountContext) -> Self {
		let ctx = Arc::new(ctx);
		let sessions = Arc::new(SessionManager::new(ctx.clone()));
		let pipeline = TransactionPipeline::new(ctx.clone(), sessions.clone());
		Self { ctx, sessions, pipeline }
	}

	pub fn address(&self) -> Address {
		self.ctx.address()
	}

	pub fn context(&self) -> &AccountContext {
		&self.ctx
	}

	pub async fn prepare_transaction(
		&self,
		transaction: Transaction,
	) -> Result<PreparedTransaction, CoreError> {
		self.pipeline.prepare(transaction).await
	}

	pub async fn sign_transaction(
		&self,
		prepared: PreparedTransaction,
	) -> Result<SignedTransaction, CoreError> {
		self.pipeline.sign(prepared).await
	}

	pub async fn submit_transaction(
		&self,
		signed: &SignedTransaction,
	) -> Result<TransactionResult, CoreError> {
		self.pipeline.submit(signed).await
	}

	/// Prepares, signs and submits `transaction`.
	pub async fn send_transaction(
		&self,
		transaction: Transaction,
	) -> Result<TransactionResult, CoreError> {
		self.pipeline.send(transaction).await
	}

	/// Waits for a terminal state, returning early on preconfirmed bundles.
	pub async fn wait_for_execution(
		&self,
		result: &TransactionResult,
	) -> Result<ExecutionOutcome, CoreError> {
		self.pipeline.wait(result, true).await
	}

	pub async fn wait_for_execution_with(
		&self,
		result: &TransactionResult,
		accept_preconfirmations: bool,
	) -> Result<ExecutionOutcome, CoreError> {
		self.pipeline.wait(result, accept_preconfirmations).await
	}

	/// Continues a persisted artifact up to submission.
	pub async fn resume(&self, artifact: PipelineArtifact) -> Result<TransactionResult, CoreError> {
		self.pipeline.resume(artifact).await
	}

	pub async fn is_session_installed(
		&self,
		chain_id: u64,
		session: &Session,
	) -> Result<bool, CoreError> {
		self.sessions.is_installed(chain_id, session).await
	}

	pub async fn ensure_session_installed(
		&self,
		chain_id: u64,
		session: &Session,
	) -> Result<InstallOutcome, CoreError> {
		self.sessions.ensure_installed(chain_id, session).await
	}

	/// Recomputed from the session content on every call.
	pub fn permission_id(&self, session: &Session) -> B256 {
		session.permission_id()
	}
}

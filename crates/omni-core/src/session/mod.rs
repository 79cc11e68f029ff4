//! Session lifecycle management.
//!
//! A session is either uninstalled or installed, and only the chain knows
//! which. The manager re-reads that state on every call and installs the
//! session through an owner-signed user operation when it is missing.

use crate::{
	context::AccountContext,
	operations::build_user_operation,
	polling::{poll_until, Poll},
	CoreError,
};
use alloy_primitives::{Address, B256, U256};
use omni_types::{
	standards::compact::compact_domain_separator, truncate_id, Call, Session, UserOperationReceipt,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// How [`SessionManager::ensure_installed`] reached the installed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
	/// The chain already reported the session as enabled; nothing was sent.
	AlreadyInstalled,
	/// An installation operation was included.
	Installed { user_op_hash: B256, receipt: UserOperationReceipt },
}

type LockKey = (u64, Address, B256);

/// Checks and installs sessions for one account.
pub struct SessionManager {
	ctx: Arc<AccountContext>,
	locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl SessionManager {
	pub fn new(ctx: Arc<AccountContext>) -> Self {
		Self { ctx, locks: Mutex::new(HashMap::new()) }
	}

	/// Reads the installation state from the Smart Sessions module.
	pub async fn is_installed(&self, chain_id: u64, session: &Session) -> Result<bool, CoreError> {
		self.ctx.ensure_chain(chain_id)?;
		let enabled = self
			.ctx
			.delivery
			.is_permission_enabled(
				chain_id,
				self.ctx.config.contracts.smart_sessions,
				session.permission_id(),
				self.ctx.address(),
			)
			.await?;
		Ok(enabled)
	}

	/// Installs `session` on `chain_id` unless it is already enabled.
	///
	/// Safe to call before every session-signed transaction. Concurrent calls
	/// for the same session are serialised and the later ones observe the
	/// installed state.
	#[instrument(skip_all, fields(chain_id = chain_id, permission_id = %truncate_id(&session.permission_id().to_string())))]
	pub async fn ensure_installed(
		&self,
		chain_id: u64,
		session: &Session,
	) -> Result<InstallOutcome, CoreError> {
		if self.is_installed(chain_id, session).await? {
			return Ok(InstallOutcome::AlreadyInstalled);
		}

		let key = (chain_id, self.ctx.address(), session.permission_id());
		let lock = self.locks.lock().await.entry(key).or_default().clone();
		let outcome = {
			let _guard = lock.lock().await;
			self.install_exclusive(chain_id, session).await
		};
		self.release_lock(&key, lock).await;
		outcome
	}

	async fn install_exclusive(
		&self,
		chain_id: u64,
		session: &Session,
	) -> Result<InstallOutcome, CoreError> {
		// Another task may have installed it while we waited for the lock.
		if self.is_installed(chain_id, session).await? {
			return Ok(InstallOutcome::AlreadyInstalled);
		}

		match self.install(chain_id, session).await {
			Ok((user_op_hash, receipt)) => {
				info!(user_op_hash = %truncate_id(&user_op_hash.to_string()), "Session installed");
				Ok(InstallOutcome::Installed { user_op_hash, receipt })
			},
			Err(e) => {
				if matches!(self.is_installed(chain_id, session).await, Ok(true)) {
					warn!(error = %e, "Installation failed but session is enabled on chain");
					return Ok(InstallOutcome::AlreadyInstalled);
				}
				Err(match e {
					CoreError::SessionInstallation(_) | CoreError::Timeout { .. } => e,
					other => CoreError::SessionInstallation(other.to_string()),
				})
			},
		}
	}

	/// Drops the per-session lock once no other task holds or awaits it.
	async fn release_lock(&self, key: &LockKey, lock: Arc<Mutex<()>>) {
		let mut locks = self.locks.lock().await;
		let idle = locks
			.get(key)
			.is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
		if idle {
			locks.remove(key);
		}
	}

	async fn install(
		&self,
		chain_id: u64,
		session: &Session,
	) -> Result<(B256, UserOperationReceipt), CoreError> {
		let ctx = &self.ctx;
		let contracts = &ctx.config.contracts;

		let app_domain_separator =
			compact_domain_separator(U256::from(chain_id), &contracts.compact);
		let calls = [Call {
			to: contracts.smart_sessions,
			value: U256::ZERO,
			data: session.enable_calldata(app_domain_separator),
		}];

		let mut user_op = build_user_operation(
			ctx,
			chain_id,
			&calls,
			ctx.owners.validator(contracts),
			ctx.owners.dummy_signature(),
		)
		.await?;

		let hash = user_op.hash(&contracts.entry_point, U256::from(chain_id))?;
		let signature = ctx.owners.produce_signature(&hash).await?;
		if !signature.is_complete() {
			return Err(CoreError::SessionInstallation(format!(
				"owner signatures incomplete: {} collected",
				signature.collected()
			)));
		}
		user_op.signature = signature.encode();

		let user_op_hash = ctx
			.delivery
			.send_user_operation(chain_id, &user_op, contracts.entry_point)
			.await?;
		info!(user_op_hash = %truncate_id(&user_op_hash.to_string()), "Session installation submitted");

		let delivery = &ctx.delivery;
		let receipt = poll_until(&ctx.retry, "session installation receipt", || async move {
			let receipt = delivery.get_user_operation_receipt(chain_id, user_op_hash).await?;
			Ok::<_, CoreError>(match receipt {
				Some(receipt) => Poll::Ready(receipt),
				None => Poll::Pending,
			})
		})
		.await?;

		if !receipt.success {
			return Err(CoreError::SessionInstallation(format!(
				"installation operation {} reverted",
				user_op_hash
			)));
		}
		Ok((user_op_hash, receipt))
	}
}

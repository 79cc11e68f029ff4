//! User operation construction.

use crate::{context::AccountContext, CoreError};
use alloy_primitives::{Address, Bytes, U256};
use omni_types::{standards::erc7579::encode_execute, Call, PackedUserOperation};
use tracing::debug;

/// Builds an unsigned user operation executing `calls` on `chain_id`.
///
/// The nonce key selects `validator`. `dummy_signature` must have the length
/// of the final signature; it stays on the returned operation until signing.
pub async fn build_user_operation(
	ctx: &AccountContext,
	chain_id: u64,
	calls: &[Call],
	validator: Address,
	dummy_signature: Bytes,
) -> Result<PackedUserOperation, CoreError> {
	ctx.ensure_chain(chain_id)?;
	let call_data = encode_execute(calls)?;
	let account = ctx.address();
	let entry_point = ctx.config.contracts.entry_point;

	let nonce_key = ctx.config.kind.nonce_key(validator);
	let nonce = ctx
		.delivery
		.get_nonce(chain_id, entry_point, account, nonce_key)
		.await?;

	let init_code = match &ctx.config.init_code {
		Some(init_code) if !ctx.delivery.is_deployed(chain_id, account).await? => {
			debug!(account = %account, "Account not deployed, attaching initCode");
			init_code.clone()
		},
		_ => Bytes::new(),
	};

	let fees = ctx.delivery.estimate_fees(chain_id).await?;

	let mut user_op = PackedUserOperation {
		sender: account,
		nonce,
		init_code,
		call_data,
		call_gas_limit: U256::ZERO,
		verification_gas_limit: U256::ZERO,
		pre_verification_gas: U256::ZERO,
		max_fee_per_gas: fees.max_fee_per_gas,
		max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
		paymaster_and_data: Bytes::new(),
		signature: dummy_signature,
	};

	let estimate = ctx
		.delivery
		.estimate_user_operation_gas(chain_id, &user_op, entry_point)
		.await?;
	user_op.call_gas_limit = estimate.call_gas_limit;
	user_op.verification_gas_limit = estimate.verification_gas_limit;
	user_op.pre_verification_gas = estimate.pre_verification_gas;

	debug!(
		chain_id = chain_id,
		nonce = %nonce,
		calls = calls.len(),
		"Built user operation"
	);
	Ok(user_op)
}

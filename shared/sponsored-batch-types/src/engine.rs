//! Batch execution: validate, verify, advance the counter, then apply every effect or none.
//!
//! Structural checks run before any signature work and never touch the counter. Once the signer
//! is verified the counter is advanced, and only then are effects applied under a host
//! checkpoint. A failure while executing unwinds the checkpoint but keeps the advanced counter,
//! so a signature that reached execution can never be replayed.

use alloc::vec::Vec;

use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::SolCall;

use crate::{
    encoding::{call_batch_digest, eth_signed_message_hash, permit_batch_digest},
    errors::BatchError,
    events::{BatchEvent, BatchReceipt},
    host::ExecutionHost,
    interfaces::IERC20Permit,
    permit::{grant_permit, PermitOutcome},
    replay::ExecutionState,
    signature::RecoverableSignature,
    types::{Call, PermitGrant, TransferInstruction, MAX_BATCH_SIZE},
};

/// `(current counter, maximum batch size)`.
pub fn info(state: &ExecutionState) -> (U256, usize) {
    (state.replay.snapshot(), MAX_BATCH_SIZE)
}

/// Run a call batch invoked by the account itself. No signature is involved: the invoking
/// identity must be the account.
pub fn execute_self<H: ExecutionHost>(
    state: &mut ExecutionState,
    host: &mut H,
    calls: &[Call],
) -> Result<BatchReceipt, BatchError> {
    validate_calls(calls)?;
    let mut state = state.enter()?;

    let caller = host.caller();
    if caller != host.account() {
        return Err(BatchError::InvalidAuthority { caller });
    }

    let counter = state.replay.advance();
    run_calls(host, counter, calls)
}

/// Run a call batch submitted by a sponsor, authorised by the account's signature over the
/// batch digest at the current counter.
pub fn execute_sponsored<H: ExecutionHost>(
    state: &mut ExecutionState,
    host: &mut H,
    calls: &[Call],
    signature: &[u8],
) -> Result<BatchReceipt, BatchError> {
    validate_calls(calls)?;
    let mut state = state.enter()?;

    let signature = RecoverableSignature::from_slice(signature)?;
    let digest = call_batch_digest(state.replay.snapshot(), calls);
    verify_signer(host, digest, &signature, host.account())?;

    let counter = state.replay.advance();
    run_calls(host, counter, calls)
}

/// Run a permit batch: for each pair, grant the permit then pull the tokens from the owner.
/// The batch signature must come from the single owner shared by every permit.
pub fn execute_permit_batch<H: ExecutionHost>(
    state: &mut ExecutionState,
    host: &mut H,
    permits: &[PermitGrant],
    transfers: &[TransferInstruction],
    signature: &[u8],
) -> Result<BatchReceipt, BatchError> {
    validate_permits(host.block_timestamp(), permits, transfers)?;
    let owner = batch_owner(host.account(), permits)?;
    let mut state = state.enter()?;

    let signature = RecoverableSignature::from_slice(signature)?;
    let digest = permit_batch_digest(state.replay.snapshot(), permits, transfers);
    verify_signer(host, digest, &signature, owner)?;

    let counter = state.replay.advance();
    run_permits(host, counter, owner, permits, transfers)
}

fn validate_calls(calls: &[Call]) -> Result<(), BatchError> {
    if calls.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    if calls.len() > MAX_BATCH_SIZE {
        return Err(BatchError::BatchTooLarge {
            len: calls.len(),
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

fn validate_permits(
    now: u64,
    permits: &[PermitGrant],
    transfers: &[TransferInstruction],
) -> Result<(), BatchError> {
    let len = permits.len().max(transfers.len());
    if len > MAX_BATCH_SIZE {
        return Err(BatchError::BatchTooLarge {
            len,
            max: MAX_BATCH_SIZE,
        });
    }
    if permits.len() != transfers.len() {
        return Err(BatchError::ArrayLengthMismatch {
            permits: permits.len(),
            transfers: transfers.len(),
        });
    }
    if permits.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    for (index, (permit, transfer)) in permits.iter().zip(transfers).enumerate() {
        if permit.token == Address::ZERO || permit.token != transfer.token {
            return Err(BatchError::InvalidToken { index });
        }
        if !permit.is_live_at(now) {
            return Err(BatchError::PermitExpired {
                index,
                deadline: permit.deadline,
            });
        }
    }
    Ok(())
}

/// The owner every permit shares. Every permit must also name the account as spender, since the
/// account is the one pulling the tokens.
fn batch_owner(account: Address, permits: &[PermitGrant]) -> Result<Address, BatchError> {
    let owner = permits[0].owner;
    for (index, permit) in permits.iter().enumerate() {
        if permit.owner != owner {
            return Err(BatchError::OwnerMismatch { index });
        }
        if permit.spender != account {
            return Err(BatchError::InvalidSpender {
                index,
                spender: permit.spender,
            });
        }
    }
    Ok(owner)
}

fn verify_signer<H: ExecutionHost>(
    host: &H,
    digest: FixedBytes<32>,
    signature: &RecoverableSignature,
    expected: Address,
) -> Result<(), BatchError> {
    let wrapped = eth_signed_message_hash(digest);
    match host.ecrecover(wrapped, signature) {
        Some(recovered) if recovered == expected && recovered != Address::ZERO => Ok(()),
        _ => Err(BatchError::InvalidSignature),
    }
}

fn run_calls<H: ExecutionHost>(
    host: &mut H,
    counter: U256,
    calls: &[Call],
) -> Result<BatchReceipt, BatchError> {
    let required = calls
        .iter()
        .fold(U256::ZERO, |acc, call| acc.saturating_add(call.value));
    let supplied = host.call_value();
    if supplied < required {
        return Err(BatchError::InsufficientETH { required, supplied });
    }

    let checkpoint = host.checkpoint();
    let mut events = Vec::with_capacity(calls.len() + 1);
    for (index, call) in calls.iter().enumerate() {
        if let Err(return_data) = host.call(call.target, call.value, &call.payload) {
            host.checkpoint_revert(checkpoint);
            return Err(BatchError::CallFailed {
                index,
                return_data: return_data.into(),
            });
        }
        events.push(BatchEvent::ItemExecuted {
            index,
            target: call.target,
            value: call.value,
            payload: call.payload.clone(),
        });
    }

    // Unspent value goes back to a sponsor. An excess that cannot be returned fails the batch.
    let invoker = host.caller();
    let excess = supplied - required;
    if excess > U256::ZERO && invoker != host.account() && host.call(invoker, excess, &[]).is_err() {
        host.checkpoint_revert(checkpoint);
        return Err(BatchError::RefundFailed { amount: excess });
    }

    host.checkpoint_commit(checkpoint);
    events.push(BatchEvent::BatchCommitted {
        counter,
        item_count: calls.len(),
        invoker,
    });
    Ok(BatchReceipt { counter, events })
}

fn run_permits<H: ExecutionHost>(
    host: &mut H,
    counter: U256,
    owner: Address,
    permits: &[PermitGrant],
    transfers: &[TransferInstruction],
) -> Result<BatchReceipt, BatchError> {
    let checkpoint = host.checkpoint();
    let mut events = Vec::with_capacity(permits.len() + 1);

    for (permit, transfer) in permits.iter().zip(transfers) {
        if let PermitOutcome::Failed { reason } = grant_permit(host, permit) {
            host.checkpoint_revert(checkpoint);
            return Err(BatchError::PermitFailed {
                token: permit.token,
                reason,
            });
        }

        let data = IERC20Permit::transferFromCall {
            from: owner,
            to: transfer.to,
            amount: transfer.amount,
        }
        .abi_encode();
        let reported = host.call(transfer.token, U256::ZERO, &data);
        let failure = match reported {
            Ok(out) if transfer_succeeded(&out) => None,
            Ok(out) | Err(out) => Some(out),
        };
        if let Some(reason) = failure {
            host.checkpoint_revert(checkpoint);
            return Err(BatchError::TransferFailed {
                token: transfer.token,
                reason: reason.into(),
            });
        }

        events.push(BatchEvent::TokenSaved {
            token: transfer.token,
            from: owner,
            to: transfer.to,
            amount: transfer.amount,
        });
    }

    host.checkpoint_commit(checkpoint);
    events.push(BatchEvent::BatchCommitted {
        counter,
        item_count: permits.len(),
        invoker: host.caller(),
    });
    Ok(BatchReceipt { counter, events })
}

/// A transfer only counts when the token explicitly returns `true`.
fn transfer_succeeded(out: &[u8]) -> bool {
    IERC20Permit::transferFromCall::abi_decode_returns(out, true)
        .map(|ret| ret.success)
        .unwrap_or(false)
}

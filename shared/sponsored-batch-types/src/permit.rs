//! Permit grants with the already-applied fallback.
//!
//! Whether a token accepts a replayed permit is implementation-defined. A failed `permit` call is
//! therefore not taken to mean "no allowance": the adapter re-reads the allowance and only fails
//! when it is actually short.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;

use crate::{host::ExecutionHost, interfaces::IERC20Permit, types::PermitGrant};

/// Result of granting one permit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermitOutcome {
    Applied,
    /// The grant call failed but the allowance already covers the requested value.
    AlreadySatisfied { allowance: U256 },
    Failed { reason: Bytes },
}

pub fn grant_permit<H: ExecutionHost>(host: &mut H, permit: &PermitGrant) -> PermitOutcome {
    let data = IERC20Permit::permitCall {
        owner: permit.owner,
        spender: permit.spender,
        value: permit.value,
        deadline: permit.deadline,
        v: permit.v,
        r: permit.r,
        s: permit.s,
    }
    .abi_encode();

    let reason = match host.call(permit.token, U256::ZERO, &data) {
        Ok(_) => return PermitOutcome::Applied,
        Err(reason) => Bytes::from(reason),
    };

    match current_allowance(host, permit) {
        Some(allowance) if allowance >= permit.value => {
            PermitOutcome::AlreadySatisfied { allowance }
        }
        _ => PermitOutcome::Failed { reason },
    }
}

/// `allowance(owner, spender)` on the permit's token, `None` if the read fails or is malformed.
pub fn current_allowance<H: ExecutionHost>(host: &H, permit: &PermitGrant) -> Option<U256> {
    let data = IERC20Permit::allowanceCall {
        owner: permit.owner,
        spender: permit.spender,
    }
    .abi_encode();
    let out = host.static_call(permit.token, &data).ok()?;
    IERC20Permit::allowanceCall::abi_decode_returns(&out, true)
        .ok()
        .map(|ret| ret.remaining)
}

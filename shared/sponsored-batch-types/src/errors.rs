use core::fmt;

use alloy_primitives::{Address, Bytes, U256};

use crate::types::Phase;

/// Errors surfaced by a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Self-execution invoked by an identity other than the account itself.
    InvalidAuthority { caller: Address },
    InvalidSignature,
    CallFailed { index: usize, return_data: Bytes },
    BatchTooLarge { len: usize, max: usize },
    InsufficientETH { required: U256, supplied: U256 },
    PermitFailed { token: Address, reason: Bytes },
    TransferFailed { token: Address, reason: Bytes },
    /// Zero token address, or a permit/transfer pair naming different tokens.
    InvalidToken { index: usize },
    PermitExpired { index: usize, deadline: U256 },
    ArrayLengthMismatch { permits: usize, transfers: usize },
    /// The permit does not name the executing account as spender.
    InvalidSpender { index: usize, spender: Address },
    EmptyBatch,
    /// A permit batch must have a single owner.
    OwnerMismatch { index: usize },
    Reentrancy,
    /// Returning unspent native value to the invoker failed.
    RefundFailed { amount: U256 },
}

impl BatchError {
    /// The phase a submission was in when this error aborted it.
    ///
    /// Only [`Phase::Executing`] failures have consumed a counter value.
    pub fn phase(&self) -> Phase {
        use BatchError::*;
        match self {
            BatchTooLarge { .. }
            | ArrayLengthMismatch { .. }
            | InvalidToken { .. }
            | PermitExpired { .. }
            | EmptyBatch
            | Reentrancy => Phase::Validating,
            InvalidAuthority { .. }
            | InvalidSignature
            | InvalidSpender { .. }
            | OwnerMismatch { .. } => Phase::Verifying,
            CallFailed { .. }
            | InsufficientETH { .. }
            | PermitFailed { .. }
            | TransferFailed { .. }
            | RefundFailed { .. } => Phase::Executing,
        }
    }

    /// Whether the failed submission burned its counter value.
    pub fn consumed_counter(&self) -> bool {
        self.phase() == Phase::Executing
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BatchError::*;
        match self {
            InvalidAuthority { caller } => write!(f, "caller {caller} is not the account"),
            InvalidSignature => f.write_str("invalid signature"),
            CallFailed { index, return_data } => {
                write!(f, "call {index} failed (return data {return_data:?})")
            }
            BatchTooLarge { len, max } => write!(f, "batch of {len} items exceeds {max}"),
            InsufficientETH { required, supplied } => {
                write!(f, "batch requires {required} wei, {supplied} supplied")
            }
            PermitFailed { token, reason } => write!(f, "permit on {token} failed ({reason:?})"),
            TransferFailed { token, reason } => {
                write!(f, "transfer of {token} failed ({reason:?})")
            }
            InvalidToken { index } => write!(f, "invalid token at index {index}"),
            PermitExpired { index, deadline } => {
                write!(f, "permit {index} expired at {deadline}")
            }
            ArrayLengthMismatch { permits, transfers } => {
                write!(f, "{permits} permits but {transfers} transfers")
            }
            InvalidSpender { index, spender } => {
                write!(f, "permit {index} names spender {spender}")
            }
            EmptyBatch => f.write_str("empty batch"),
            OwnerMismatch { index } => write!(f, "permit {index} has a different owner"),
            Reentrancy => f.write_str("batch already executing"),
            RefundFailed { amount } => write!(f, "refund of {amount} wei failed"),
        }
    }
}

/// Account code that is neither empty nor a delegation designator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedCode {
    pub len: usize,
}

impl fmt::Display for UnrecognizedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized account code ({} bytes)", self.len)
    }
}

/// Errors while normalising a 65-byte signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    InvalidLength(usize),
    InvalidRecoveryId(u8),
    /// `s` lies in the upper half of the curve order.
    MalleableS,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::InvalidLength(len) => write!(f, "signature is {len} bytes, expected 65"),
            SignatureError::InvalidRecoveryId(v) => write!(f, "unsupported recovery id {v}"),
            SignatureError::MalleableS => f.write_str("signature s is not in the lower half order"),
        }
    }
}

impl From<SignatureError> for BatchError {
    fn from(_: SignatureError) -> Self {
        BatchError::InvalidSignature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors_do_not_consume_counter() {
        assert!(!BatchError::BatchTooLarge { len: 51, max: 50 }.consumed_counter());
        assert!(!BatchError::InvalidSignature.consumed_counter());
        assert!(BatchError::CallFailed {
            index: 0,
            return_data: Bytes::new()
        }
        .consumed_counter());
    }
}

//! Solidity custom errors surfaced as revert data.

use alloy_sol_types::sol;
use stylus_sdk::{
    alloy_primitives::U256,
    stylus_proc::SolidityError,
};

use sponsored_batch_types::BatchError;

sol! {
    error InvalidAuthority(address caller);
    error InvalidSignature();
    error CallFailed(uint256 index, bytes returnData);
    error BatchTooLarge(uint256 length, uint256 maxBatchSize);
    error InsufficientETH(uint256 required, uint256 supplied);
    error PermitFailed(address token, bytes reason);
    error TransferFailed(address token, bytes reason);
    error InvalidToken(uint256 index);
    error PermitExpired(uint256 index, uint256 deadline);
    error ArrayLengthMismatch(uint256 permits, uint256 transfers);
    error InvalidSpender(uint256 index, address spender);
    error EmptyBatch();
    error OwnerMismatch(uint256 index);
    error ReentrantCall();
    error RefundFailed(uint256 amount);
}

#[derive(SolidityError)]
pub enum ExecutorError {
    InvalidAuthority(InvalidAuthority),
    InvalidSignature(InvalidSignature),
    CallFailed(CallFailed),
    BatchTooLarge(BatchTooLarge),
    InsufficientETH(InsufficientETH),
    PermitFailed(PermitFailed),
    TransferFailed(TransferFailed),
    InvalidToken(InvalidToken),
    PermitExpired(PermitExpired),
    ArrayLengthMismatch(ArrayLengthMismatch),
    InvalidSpender(InvalidSpender),
    EmptyBatch(EmptyBatch),
    OwnerMismatch(OwnerMismatch),
    ReentrantCall(ReentrantCall),
    RefundFailed(RefundFailed),
}

fn word(n: usize) -> U256 {
    U256::from(n)
}

impl From<BatchError> for ExecutorError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::InvalidAuthority { caller } => {
                Self::InvalidAuthority(InvalidAuthority { caller })
            }
            BatchError::InvalidSignature => Self::InvalidSignature(InvalidSignature {}),
            BatchError::CallFailed { index, return_data } => Self::CallFailed(CallFailed {
                index: word(index),
                returnData: return_data,
            }),
            BatchError::BatchTooLarge { len, max } => Self::BatchTooLarge(BatchTooLarge {
                length: word(len),
                maxBatchSize: word(max),
            }),
            BatchError::InsufficientETH { required, supplied } => {
                Self::InsufficientETH(InsufficientETH { required, supplied })
            }
            BatchError::PermitFailed { token, reason } => {
                Self::PermitFailed(PermitFailed { token, reason })
            }
            BatchError::TransferFailed { token, reason } => {
                Self::TransferFailed(TransferFailed { token, reason })
            }
            BatchError::InvalidToken { index } => Self::InvalidToken(InvalidToken {
                index: word(index),
            }),
            BatchError::PermitExpired { index, deadline } => Self::PermitExpired(PermitExpired {
                index: word(index),
                deadline,
            }),
            BatchError::ArrayLengthMismatch { permits, transfers } => {
                Self::ArrayLengthMismatch(ArrayLengthMismatch {
                    permits: word(permits),
                    transfers: word(transfers),
                })
            }
            BatchError::InvalidSpender { index, spender } => {
                Self::InvalidSpender(InvalidSpender {
                    index: word(index),
                    spender,
                })
            }
            BatchError::EmptyBatch => Self::EmptyBatch(EmptyBatch {}),
            BatchError::OwnerMismatch { index } => Self::OwnerMismatch(OwnerMismatch {
                index: word(index),
            }),
            BatchError::Reentrancy => Self::ReentrantCall(ReentrantCall {}),
            BatchError::RefundFailed { amount } => Self::RefundFailed(RefundFailed { amount }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use alloy_sol_types::SolError;
    use stylus_sdk::alloy_primitives::Bytes;

    fn revert_data(err: BatchError) -> Vec<u8> {
        ExecutorError::from(err).into()
    }

    #[test]
    fn revert_data_starts_with_error_selector() {
        let data = revert_data(BatchError::BatchTooLarge { len: 51, max: 50 });
        assert_eq!(&data[..4], BatchTooLarge::SELECTOR.as_slice());

        let decoded = BatchTooLarge::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.length, U256::from(51u64));
        assert_eq!(decoded.maxBatchSize, U256::from(50u64));
    }

    #[test]
    fn execution_failures_keep_their_payload() {
        let data = revert_data(BatchError::CallFailed {
            index: 3,
            return_data: Bytes::from_static(&[0xaa, 0xbb]),
        });
        let decoded = CallFailed::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.index, U256::from(3u64));
        assert_eq!(decoded.returnData.as_ref(), &[0xaa, 0xbb]);
    }

    #[test]
    fn reentrancy_maps_to_reentrant_call() {
        let data = revert_data(BatchError::Reentrancy);
        assert_eq!(&data[..], ReentrantCall::SELECTOR.as_slice());
    }
}

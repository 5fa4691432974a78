use alloc::vec::Vec;

use alloy_primitives::{Address, FixedBytes, U256};

use crate::signature::RecoverableSignature;

/// Opaque handle to a journal position, returned by [`ExecutionHost::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(pub usize);

/// Execution environment abstraction, implemented differently on-chain vs off-chain.
///
/// On-chain, a failed batch reverts the whole call frame, so the journal methods default to
/// no-ops. Off-chain hosts keep a journal so a failed batch can be unwound without discarding the
/// counter advance that preceded it.
pub trait ExecutionHost {
    /// Address the executor code runs as: the delegating account.
    fn account(&self) -> Address;

    /// Identity that invoked the current entry point.
    fn caller(&self) -> Address;

    /// Native value supplied with the invocation.
    fn call_value(&self) -> U256;

    fn block_timestamp(&self) -> u64;

    /// Recover the signer of `digest`, or `None` if recovery fails.
    fn ecrecover(&self, digest: FixedBytes<32>, signature: &RecoverableSignature) -> Option<Address>;

    /// Message call from the account. `Err` carries the revert data.
    fn call(&mut self, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>>;

    /// Read-only call from the account.
    fn static_call(&self, target: Address, data: &[u8]) -> Result<Vec<u8>, Vec<u8>>;

    fn checkpoint(&mut self) -> Checkpoint {
        Checkpoint(0)
    }

    fn checkpoint_commit(&mut self, _checkpoint: Checkpoint) {}

    fn checkpoint_revert(&mut self, _checkpoint: Checkpoint) {}
}

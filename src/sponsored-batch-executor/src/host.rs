//! On-chain execution host backed by raw EVM calls.

use alloc::vec::Vec;

use stylus_sdk::{
    alloy_primitives::{Address, FixedBytes, U256},
    call::RawCall,
};

use sponsored_batch_types::{ExecutionHost, RecoverableSignature};

use crate::utils::crypto::ecrecover_address;

/// Call context captured at the entry point. All calls are made from the executing account.
///
/// A failed batch reverts the whole call frame here, so the journal methods keep their no-op
/// defaults.
#[derive(Clone, Copy, Debug)]
pub struct OnchainHost {
    pub account: Address,
    pub caller: Address,
    pub value: U256,
    pub now: u64,
}

impl ExecutionHost for OnchainHost {
    fn account(&self) -> Address {
        self.account
    }

    fn caller(&self) -> Address {
        self.caller
    }

    fn call_value(&self) -> U256 {
        self.value
    }

    fn block_timestamp(&self) -> u64 {
        self.now
    }

    fn ecrecover(
        &self,
        digest: FixedBytes<32>,
        signature: &RecoverableSignature,
    ) -> Option<Address> {
        ecrecover_address(digest, signature).ok()
    }

    fn call(&mut self, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        unsafe { RawCall::new_with_value(value).call(target, data) }
    }

    fn static_call(&self, target: Address, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        unsafe { RawCall::new_static().call(target, data) }
    }
}

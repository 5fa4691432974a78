//! Stylus entry points of the sponsored batch executor.
//!
//! The executor runs as the code of an EIP-7702 delegated account, so `contract_address()` is the
//! account itself. Three entry points converge on the shared engine:
//! - `executeSelf`: the account calls itself, no signature.
//! - `executeSponsored`: anyone submits a call batch signed by the account.
//! - `executePermitBatch`: anyone submits permit + transfer pairs signed by the token owner.
//!
//! Every failure reverts the call frame. The replay counter is only ever written after the engine
//! has advanced it.

use alloc::{vec, vec::Vec};

use stylus_sdk::{abi::Bytes, alloy_primitives::U256, prelude::*, stylus_core::log};

use sponsored_batch_types::{
    engine,
    interfaces::{BatchCommitted, ItemExecuted, TokenSaved},
    BatchError, BatchEvent, BatchReceipt, ExecutionState, ReplayGuard,
};

use crate::{
    errors::ExecutorError,
    host::OnchainHost,
    utils::abi::{to_calls, to_permits, to_transfers, CallTuple, PermitTuple, TransferTuple},
};

sol_storage! {
    /// Per-account executor state.
    #[entrypoint]
    pub struct SponsoredBatchExecutor {
        /// Replay counter. Every batch that passes verification consumes one value.
        uint256 nonce;

        /// Set while a batch is executing.
        bool executing;
    }
}

#[public]
impl SponsoredBatchExecutor {
    /// Run `calls` as the account itself. Only the account may invoke this.
    #[payable]
    pub fn execute_self(&mut self, calls: Vec<CallTuple>) -> Result<(), ExecutorError> {
        let calls = to_calls(calls);
        self.run(|state, host| engine::execute_self(state, host, &calls))
    }

    /// Run `calls` on behalf of the account, authorised by its signature over the batch digest at
    /// the current nonce.
    #[payable]
    pub fn execute_sponsored(
        &mut self,
        calls: Vec<CallTuple>,
        signature: Bytes,
    ) -> Result<(), ExecutorError> {
        let calls = to_calls(calls);
        self.run(|state, host| engine::execute_sponsored(state, host, &calls, &signature))
    }

    /// Grant each permit and pull the paired transfer from the shared owner.
    pub fn execute_permit_batch(
        &mut self,
        permits: Vec<PermitTuple>,
        transfers: Vec<TransferTuple>,
        signature: Bytes,
    ) -> Result<(), ExecutorError> {
        let permits = to_permits(permits);
        let transfers = to_transfers(transfers);
        self.run(|state, host| {
            engine::execute_permit_batch(state, host, &permits, &transfers, &signature)
        })
    }

    /// `(nonce, maxBatchSize)`.
    pub fn get_info(&self) -> (U256, U256) {
        let (nonce, max_batch_size) = engine::info(&self.state());
        (nonce, U256::from(max_batch_size))
    }
}

impl SponsoredBatchExecutor {
    fn state(&self) -> ExecutionState {
        ExecutionState::new(ReplayGuard::from_counter(self.nonce.get()))
    }

    fn host(&self) -> OnchainHost {
        OnchainHost {
            account: self.vm().contract_address(),
            caller: self.vm().msg_sender(),
            value: self.vm().msg_value(),
            now: self.vm().block_timestamp(),
        }
    }

    fn run<F>(&mut self, batch: F) -> Result<(), ExecutorError>
    where
        F: FnOnce(&mut ExecutionState, &mut OnchainHost) -> Result<BatchReceipt, BatchError>,
    {
        if self.executing.get() {
            return Err(BatchError::Reentrancy.into());
        }
        let mut host = self.host();
        let mut state = self.state();

        self.executing.set(true);
        let result = batch(&mut state, &mut host);
        self.executing.set(false);
        // Written after the batch's external calls. A re-entered entry point fails on
        // `executing`, and a failed batch reverts this frame with the write.
        self.nonce.set(state.replay.snapshot());

        for event in result?.events {
            self.emit(event);
        }
        Ok(())
    }

    fn emit(&self, event: BatchEvent) {
        match event {
            BatchEvent::ItemExecuted {
                index,
                target,
                value,
                payload,
            } => log(
                self.vm(),
                ItemExecuted {
                    index: U256::from(index),
                    target,
                    value,
                    data: payload,
                },
            ),
            BatchEvent::TokenSaved {
                token,
                from,
                to,
                amount,
            } => log(
                self.vm(),
                TokenSaved {
                    token,
                    from,
                    to,
                    amount,
                },
            ),
            BatchEvent::BatchCommitted {
                counter,
                item_count,
                invoker,
            } => log(
                self.vm(),
                BatchCommitted {
                    nonce: counter,
                    itemCount: U256::from(item_count),
                    invoker,
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylus_sdk::{
        alloy_primitives::{address, Address},
        testing::*,
    };

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000ac");
    const SPONSOR: Address = address!("00000000000000000000000000000000000005b0");

    fn deployed() -> (TestVM, SponsoredBatchExecutor) {
        let vm = TestVM::default();
        vm.set_contract_address(ACCOUNT);
        vm.set_sender(SPONSOR);
        let contract = SponsoredBatchExecutor::from(&vm);
        (vm, contract)
    }

    fn payment() -> CallTuple {
        (SPONSOR, U256::ZERO, Bytes::from(vec![0u8; 0]))
    }

    #[test]
    fn fresh_account_reports_info() {
        let (_vm, contract) = deployed();
        assert_eq!(contract.get_info(), (U256::ZERO, U256::from(50u64)));
    }

    #[test]
    fn self_execution_from_another_caller_keeps_nonce() {
        let (_vm, mut contract) = deployed();

        let err = contract.execute_self(vec![payment()]).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidAuthority(e) if e.caller == SPONSOR));
        assert_eq!(contract.nonce.get(), U256::ZERO);
        assert!(!contract.executing.get());
    }

    #[test]
    fn malformed_signature_keeps_nonce() {
        let (_vm, mut contract) = deployed();

        let err = contract
            .execute_sponsored(vec![payment()], Bytes::from(vec![0u8; 3]))
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidSignature(_)));
        assert_eq!(contract.get_info().0, U256::ZERO);
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let (_vm, mut contract) = deployed();

        let err = contract
            .execute_sponsored(vec![payment(); 51], Bytes::from(vec![0u8; 0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::BatchTooLarge(e)
                if e.length == U256::from(51u64) && e.maxBatchSize == U256::from(50u64)
        ));
        assert_eq!(contract.get_info().0, U256::ZERO);
    }

    #[test]
    fn executing_flag_rejects_entry() {
        let (vm, mut contract) = deployed();
        vm.set_sender(ACCOUNT);
        contract.executing.set(true);

        let err = contract.execute_self(vec![payment()]).unwrap_err();
        assert!(matches!(err, ExecutorError::ReentrantCall(_)));
        let err = contract
            .execute_permit_batch(vec![], vec![], Bytes::from(vec![0u8; 0]))
            .unwrap_err();
        assert!(matches!(err, ExecutorError::ReentrantCall(_)));
        assert_eq!(contract.nonce.get(), U256::ZERO);
    }
}

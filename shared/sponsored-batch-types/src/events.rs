use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, U256};

/// Structured events emitted by a committed batch, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchEvent {
    ItemExecuted {
        index: usize,
        target: Address,
        value: U256,
        payload: Bytes,
    },
    TokenSaved {
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    },
    BatchCommitted {
        /// Counter value the batch consumed (pre-advance).
        counter: U256,
        item_count: usize,
        invoker: Address,
    },
}

/// Outcome of a committed batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchReceipt {
    pub counter: U256,
    pub events: Vec<BatchEvent>,
}

impl BatchReceipt {
    pub fn committed(&self) -> Option<&BatchEvent> {
        self.events
            .iter()
            .find(|e| matches!(e, BatchEvent::BatchCommitted { .. }))
    }
}

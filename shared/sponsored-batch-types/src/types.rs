use alloy_primitives::{Address, Bytes, FixedBytes, U256};

/// Hard cap on the number of items in a single batch.
pub const MAX_BATCH_SIZE: usize = 50;

/// One opaque effect applied by the executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    /// Native currency forwarded with the call.
    pub value: U256,
    pub payload: Bytes,
}

impl Call {
    pub fn new(target: Address, value: U256, payload: impl Into<Bytes>) -> Self {
        Self {
            target,
            value,
            payload: payload.into(),
        }
    }
}

/// EIP-2612 allowance grant from `owner` to `spender`, authorised by the owner's typed signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermitGrant {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    /// Unix timestamp (inclusive).
    pub deadline: U256,
    pub v: u8,
    pub r: FixedBytes<32>,
    pub s: FixedBytes<32>,
}

impl PermitGrant {
    /// Whether the grant is still usable at `now`. A deadline equal to `now` is accepted.
    pub fn is_live_at(&self, now: u64) -> bool {
        self.deadline >= U256::from(now)
    }
}

/// Moves `amount` of `token` from the batch owner to `to`. Paired 1:1 with a [`PermitGrant`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferInstruction {
    pub token: Address,
    pub to: Address,
    pub amount: U256,
}

/// Lifecycle phase of a batch submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Structural checks, no signature work and no state touched.
    Validating,
    /// Authentication and counter advance.
    Verifying,
    /// Effects are being applied under a checkpoint.
    Executing,
    Committed,
}

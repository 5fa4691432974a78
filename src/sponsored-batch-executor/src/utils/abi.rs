//! Conversions from the ABI tuples taken by the public entry points into batch types.
//!
//! A Solidity `struct` is ABI-equivalent to a tuple, and tuples are what the `#[public]` glue
//! decodes, so the entry points take these aliases instead of `sol!` structs.

use alloc::vec::Vec;

use stylus_sdk::{
    abi::Bytes,
    alloy_primitives::{Address, FixedBytes, U256},
};

use sponsored_batch_types::{Call, PermitGrant, TransferInstruction};

/// `(address target, uint256 value, bytes data)`
pub type CallTuple = (Address, U256, Bytes);

/// `(address token, address owner, address spender, uint256 value, uint256 deadline, uint8 v,
/// bytes32 r, bytes32 s)`
pub type PermitTuple = (
    Address,
    Address,
    Address,
    U256,
    U256,
    u8,
    FixedBytes<32>,
    FixedBytes<32>,
);

/// `(address token, address to, uint256 amount)`
pub type TransferTuple = (Address, Address, U256);

pub fn to_calls(calls: Vec<CallTuple>) -> Vec<Call> {
    calls
        .into_iter()
        .map(|(target, value, data)| Call::new(target, value, data.to_vec()))
        .collect()
}

pub fn to_permits(permits: Vec<PermitTuple>) -> Vec<PermitGrant> {
    permits
        .into_iter()
        .map(
            |(token, owner, spender, value, deadline, v, r, s)| PermitGrant {
                token,
                owner,
                spender,
                value,
                deadline,
                v,
                r,
                s,
            },
        )
        .collect()
}

pub fn to_transfers(transfers: Vec<TransferTuple>) -> Vec<TransferInstruction> {
    transfers
        .into_iter()
        .map(|(token, to, amount)| TransferInstruction { token, to, amount })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use stylus_sdk::alloy_primitives::address;

    #[test]
    fn converts_call_tuples_in_order() {
        let a = address!("00000000000000000000000000000000000000a1");
        let b = address!("00000000000000000000000000000000000000b2");
        let calls = to_calls(vec![
            (a, U256::from(5u64), Bytes::from(vec![1u8, 2, 3])),
            (b, U256::ZERO, Bytes::from(Vec::new())),
        ]);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].target, a);
        assert_eq!(calls[0].value, U256::from(5u64));
        assert_eq!(calls[0].payload.as_ref(), &[1u8, 2, 3]);
        assert!(calls[1].payload.is_empty());
    }

    #[test]
    fn converts_permit_and_transfer_tuples() {
        let token = address!("00000000000000000000000000000000000000c3");
        let owner = address!("00000000000000000000000000000000000000d4");
        let spender = address!("00000000000000000000000000000000000000e5");
        let permits = to_permits(vec![(
            token,
            owner,
            spender,
            U256::from(1000u64),
            U256::from(99u64),
            28,
            FixedBytes::repeat_byte(1),
            FixedBytes::repeat_byte(2),
        )]);
        assert_eq!(permits[0].owner, owner);
        assert_eq!(permits[0].spender, spender);
        assert_eq!(permits[0].deadline, U256::from(99u64));
        assert_eq!(permits[0].v, 28);
        assert_eq!(permits[0].s, FixedBytes::repeat_byte(2));

        let transfers = to_transfers(vec![(token, owner, U256::from(7u64))]);
        assert_eq!(
            transfers[0],
            TransferInstruction {
                token,
                to: owner,
                amount: U256::from(7u64)
            }
        );
    }
}

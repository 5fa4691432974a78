//! Canonical batch digests and the personal-message wrapper.
//!
//! Both digests use packed encoding: addresses are 20 bytes, integers are 32-byte big-endian
//! words and call payloads are appended raw. The replay counter is part of every digest, so a
//! signature is only ever valid for one counter value.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, FixedBytes, U256};

use crate::types::{Call, PermitGrant, TransferInstruction};

/// Prefix of the personal-message signing convention for a 32-byte payload.
pub const SIGNED_MESSAGE_PREFIX: &[u8; 28] = b"\x19Ethereum Signed Message:\n32";

/// Packed bytes of a call batch: `target || value || payload` per call, in order.
pub fn encode_calls(calls: &[Call]) -> Vec<u8> {
    let payload_len: usize = calls.iter().map(|c| c.payload.len()).sum();
    let mut buf = Vec::with_capacity(calls.len() * (20 + 32) + payload_len);
    for call in calls {
        buf.extend_from_slice(call.target.as_slice());
        buf.extend_from_slice(&call.value.to_be_bytes::<32>());
        buf.extend_from_slice(&call.payload);
    }
    buf
}

/// Raw digest of a call batch bound to `counter`: `keccak256(counter || encode_calls(calls))`.
pub fn call_batch_digest(counter: U256, calls: &[Call]) -> FixedBytes<32> {
    let encoded = encode_calls(calls);
    let mut buf = Vec::with_capacity(32 + encoded.len());
    buf.extend_from_slice(&counter.to_be_bytes::<32>());
    buf.extend_from_slice(&encoded);
    keccak256(buf)
}

/// Raw digest of a permit batch bound to `counter`.
///
/// Seeded with `keccak256(len(permits) || len(transfers) || counter)`, then each pair is folded
/// into the running hash in order, so the digest commits to item order without buffering the
/// whole batch.
pub fn permit_batch_digest(
    counter: U256,
    permits: &[PermitGrant],
    transfers: &[TransferInstruction],
) -> FixedBytes<32> {
    let mut seed = [0u8; 32 * 3];
    seed[0..32].copy_from_slice(&U256::from(permits.len()).to_be_bytes::<32>());
    seed[32..64].copy_from_slice(&U256::from(transfers.len()).to_be_bytes::<32>());
    seed[64..96].copy_from_slice(&counter.to_be_bytes::<32>());
    let mut hash = keccak256(seed);

    for (permit, transfer) in permits.iter().zip(transfers) {
        hash = fold_pair(hash, permit, transfer);
    }
    hash
}

fn fold_pair(
    hash: FixedBytes<32>,
    permit: &PermitGrant,
    transfer: &TransferInstruction,
) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 + 20 * 3 + 32 * 2 + 20 * 2 + 32);
    buf.extend_from_slice(hash.as_slice());
    buf.extend_from_slice(permit.token.as_slice());
    buf.extend_from_slice(permit.owner.as_slice());
    buf.extend_from_slice(permit.spender.as_slice());
    buf.extend_from_slice(&permit.value.to_be_bytes::<32>());
    buf.extend_from_slice(&permit.deadline.to_be_bytes::<32>());
    buf.extend_from_slice(transfer.token.as_slice());
    buf.extend_from_slice(transfer.to.as_slice());
    buf.extend_from_slice(&transfer.amount.to_be_bytes::<32>());
    keccak256(buf)
}

/// `keccak256("\x19Ethereum Signed Message:\n32" || digest)`.
///
/// This is the value that is signed and recovered against, never the raw digest.
pub fn eth_signed_message_hash(digest: FixedBytes<32>) -> FixedBytes<32> {
    let mut buf = [0u8; 28 + 32];
    buf[..28].copy_from_slice(SIGNED_MESSAGE_PREFIX);
    buf[28..].copy_from_slice(digest.as_slice());
    keccak256(buf)
}

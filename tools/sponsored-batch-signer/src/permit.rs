//! EIP-2612 permit digests, computed the way a permit token does on-chain.

use alloy_primitives::{Address, FixedBytes, U256};
use anyhow::Result;
use sha3::{Digest, Keccak256};

use sponsored_batch_types::PermitGrant;

use crate::signer::LocalSigner;

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const PERMIT_TYPE: &[u8] =
    b"Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// EIP-712 domain of a permit token. `verifying_contract` is the token itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermitDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

/// The typed `Permit` message a token owner signs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PermitMessage {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

fn address_word(addr: Address) -> [u8; 32] {
    let mut padded = [0u8; 32];
    padded[12..32].copy_from_slice(addr.as_slice());
    padded
}

pub fn domain_separator(domain: &PermitDomain) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(keccak256_bytes(DOMAIN_TYPE).as_slice());
    buf.extend_from_slice(keccak256_bytes(domain.name.as_bytes()).as_slice());
    buf.extend_from_slice(keccak256_bytes(domain.version.as_bytes()).as_slice());
    buf.extend_from_slice(&U256::from(domain.chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&address_word(domain.verifying_contract));
    keccak256_bytes(&buf)
}

pub fn permit_struct_hash(message: &PermitMessage) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 6);
    buf.extend_from_slice(keccak256_bytes(PERMIT_TYPE).as_slice());
    buf.extend_from_slice(&address_word(message.owner));
    buf.extend_from_slice(&address_word(message.spender));
    buf.extend_from_slice(&message.value.to_be_bytes::<32>());
    buf.extend_from_slice(&message.nonce.to_be_bytes::<32>());
    buf.extend_from_slice(&message.deadline.to_be_bytes::<32>());
    keccak256_bytes(&buf)
}

/// `keccak256(0x1901 || domainSeparator || structHash)`: the digest `permit` recovers against.
pub fn permit_digest(domain: &PermitDomain, message: &PermitMessage) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(domain_separator(domain).as_slice());
    buf.extend_from_slice(permit_struct_hash(message).as_slice());
    keccak256_bytes(&buf)
}

/// Sign `message` for the token in `domain` and package it as a grant the executor can submit.
///
/// The signer must be the message's owner, otherwise the token will reject the permit.
pub fn sign_permit(
    signer: &LocalSigner,
    domain: &PermitDomain,
    message: &PermitMessage,
) -> Result<PermitGrant> {
    let sig = signer.sign_prehash(permit_digest(domain, message))?;
    Ok(PermitGrant {
        token: domain.verifying_contract,
        owner: message.owner,
        spender: message.spender,
        value: message.value,
        deadline: message.deadline,
        v: sig.v,
        r: sig.r,
        s: sig.s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_sol_types::{sol, Eip712Domain, SolStruct};

    sol! {
        struct Permit {
            address owner;
            address spender;
            uint256 value;
            uint256 nonce;
            uint256 deadline;
        }
    }

    fn domain() -> PermitDomain {
        PermitDomain {
            name: "Test Token".to_string(),
            version: "1".to_string(),
            chain_id: 42161,
            verifying_contract: address!("00000000000000000000000000000000000000a1"),
        }
    }

    fn message() -> PermitMessage {
        PermitMessage {
            owner: address!("00000000000000000000000000000000000000b1"),
            spender: address!("00000000000000000000000000000000000000c1"),
            value: U256::from(1_000u64),
            nonce: U256::from(3u64),
            deadline: U256::from(1_700_000_000u64),
        }
    }

    #[test]
    fn digest_matches_typed_data_hashing() {
        let d = domain();
        let m = message();
        let typed_domain = Eip712Domain::new(
            Some(d.name.clone().into()),
            Some(d.version.clone().into()),
            Some(U256::from(d.chain_id)),
            Some(d.verifying_contract),
            None,
        );
        let typed = Permit {
            owner: m.owner,
            spender: m.spender,
            value: m.value,
            nonce: m.nonce,
            deadline: m.deadline,
        };

        assert_eq!(domain_separator(&d), typed_domain.separator());
        assert_eq!(permit_struct_hash(&m), typed.eip712_hash_struct());
        assert_eq!(permit_digest(&d, &m), typed.eip712_signing_hash(&typed_domain));
    }

    #[test]
    fn nonce_and_chain_change_the_digest() {
        let d = domain();
        let m = message();
        let base = permit_digest(&d, &m);

        let bumped = PermitMessage { nonce: m.nonce + U256::from(1u64), ..m };
        assert_ne!(permit_digest(&d, &bumped), base);

        let other_chain = PermitDomain { chain_id: 1, ..d };
        assert_ne!(permit_digest(&other_chain, &m), base);
    }

    #[test]
    fn signed_permit_recovers_to_owner() {
        let signer = LocalSigner::from_hex(
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        )
        .unwrap();
        let d = domain();
        let m = PermitMessage { owner: signer.address(), ..message() };

        let grant = sign_permit(&signer, &d, &m).unwrap();
        assert_eq!(grant.token, d.verifying_contract);
        let sig = sponsored_batch_types::RecoverableSignature::from_parts(grant.r, grant.s, grant.v)
            .unwrap();
        assert_eq!(crate::signer::recover(permit_digest(&d, &m), &sig), Some(signer.address()));
    }
}

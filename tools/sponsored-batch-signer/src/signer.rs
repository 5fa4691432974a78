use alloy_primitives::{Address, FixedBytes, U256};
use anyhow::{anyhow, Context, Result};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use sponsored_batch_types::{
    call_batch_digest, eth_signed_message_hash, permit_batch_digest, Call, PermitGrant,
    RecoverableSignature, TransferInstruction,
};

/// A secp256k1 key held in memory, signing batch digests on behalf of an account or token owner.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    pub fn new(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// Parse a hex private key, with or without a `0x` prefix.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let raw = hex::decode(private_key.trim().trim_start_matches("0x"))
            .context("private key is not valid hex")?;
        let key = SigningKey::from_slice(&raw).context("private key is not a valid secp256k1 scalar")?;
        Ok(Self::new(key))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash as-is. The result has `v` in `{27, 28}`.
    pub fn sign_prehash(&self, digest: FixedBytes<32>) -> Result<RecoverableSignature> {
        // k256 already emits low-s signatures, which `from_parts` requires.
        let (signature, recid) = self
            .key
            .sign_prehash_recoverable(digest.as_slice())
            .map_err(|e| anyhow!("signing failed: {e}"))?;

        let (r, s) = signature.split_bytes();
        RecoverableSignature::from_parts(
            FixedBytes::from_slice(r.as_slice()),
            FixedBytes::from_slice(s.as_slice()),
            27 + recid.to_byte(),
        )
        .map_err(|e| anyhow!("signer produced an unusable signature: {e}"))
    }

    /// Sign a call batch at `counter`, the way `executeSponsored` verifies it.
    pub fn sign_call_batch(&self, counter: U256, calls: &[Call]) -> Result<RecoverableSignature> {
        let digest = call_batch_digest(counter, calls);
        tracing::debug!(%counter, items = calls.len(), %digest, "signing call batch");
        self.sign_prehash(eth_signed_message_hash(digest))
    }

    /// Sign a permit batch at `counter`, the way `executePermitBatch` verifies it.
    pub fn sign_permit_batch(
        &self,
        counter: U256,
        permits: &[PermitGrant],
        transfers: &[TransferInstruction],
    ) -> Result<RecoverableSignature> {
        let digest = permit_batch_digest(counter, permits, transfers);
        tracing::debug!(%counter, items = permits.len(), %digest, "signing permit batch");
        self.sign_prehash(eth_signed_message_hash(digest))
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Ethereum address of a public key: the last 20 bytes of `keccak256(x || y)`.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Off-chain counterpart of the `ecrecover` precompile.
pub fn recover(digest: FixedBytes<32>, signature: &RecoverableSignature) -> Option<Address> {
    let bytes = signature.to_bytes();
    let sig = Signature::from_slice(&bytes[..64]).ok()?;
    let recid = RecoveryId::from_byte(signature.recovery_id())?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recid).ok()?;
    Some(address_of(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes};

    // Well-known development key (anvil account #0).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn derives_the_known_address() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        assert_eq!(
            signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(LocalSigner::from_hex("0xzz").is_err());
        assert!(LocalSigner::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn signatures_recover_to_the_signer() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        let calls = vec![Call::new(
            address!("00000000000000000000000000000000000000c1"),
            U256::from(1u64),
            Bytes::from_static(&[0xde, 0xad]),
        )];
        let sig = signer.sign_call_batch(U256::ZERO, &calls).unwrap();
        assert!(sig.v == 27 || sig.v == 28);

        let wrapped = eth_signed_message_hash(call_batch_digest(U256::ZERO, &calls));
        assert_eq!(recover(wrapped, &sig), Some(signer.address()));

        let other = eth_signed_message_hash(call_batch_digest(U256::from(1u64), &calls));
        assert_ne!(recover(other, &sig), Some(signer.address()));
    }

    #[test]
    fn signatures_are_always_low_s() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        for byte in 0u8..32 {
            let sig = signer.sign_prehash(FixedBytes::repeat_byte(byte)).unwrap();
            assert!(U256::from_be_bytes(sig.s.0) <= sponsored_batch_types::signature::SECP256K1N_HALF);
        }
    }

    #[test]
    fn signatures_parse_back_through_the_normaliser() {
        let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
        let sig = signer.sign_prehash(FixedBytes::repeat_byte(0x42)).unwrap();
        assert_eq!(RecoverableSignature::from_slice(&sig.to_bytes()).unwrap(), sig);
    }
}

//! Recoverable ECDSA signatures (`r || s || v`).

use alloy_primitives::{uint, FixedBytes, U256};

use crate::errors::SignatureError;

/// Upper bound (inclusive) for a canonical `s` value: `secp256k1n / 2`.
pub const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// A normalised 65-byte signature with `v` in `{27, 28}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: FixedBytes<32>,
    pub s: FixedBytes<32>,
    pub v: u8,
}

impl RecoverableSignature {
    /// Parse `r || s || v`, accepting `v` in `{0, 1, 27, 28}` and rejecting high-`s` signatures.
    pub fn from_slice(sig: &[u8]) -> Result<Self, SignatureError> {
        if sig.len() != 65 {
            return Err(SignatureError::InvalidLength(sig.len()));
        }
        let r = FixedBytes::<32>::from_slice(&sig[0..32]);
        let s = FixedBytes::<32>::from_slice(&sig[32..64]);
        let v = match sig[64] {
            v @ (27 | 28) => v,
            v @ (0 | 1) => v + 27,
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };
        Self::from_parts(r, s, v)
    }

    pub fn from_parts(r: FixedBytes<32>, s: FixedBytes<32>, v: u8) -> Result<Self, SignatureError> {
        if U256::from_be_bytes(s.0) > SECP256K1N_HALF {
            return Err(SignatureError::MalleableS);
        }
        if v != 27 && v != 28 {
            return Err(SignatureError::InvalidRecoveryId(v));
        }
        Ok(Self { r, s, v })
    }

    /// Recovery id in `{0, 1}`.
    pub fn recovery_id(&self) -> u8 {
        self.v - 27
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0..32].copy_from_slice(self.r.as_slice());
        out[32..64].copy_from_slice(self.s.as_slice());
        out[64] = self.v;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(v: u8, s_high: bool) -> [u8; 65] {
        let mut sig = [0u8; 65];
        sig[0] = 1;
        sig[63] = 1;
        if s_high {
            sig[32] = 0xff;
        }
        sig[64] = v;
        sig
    }

    #[test]
    fn normalises_recovery_id() {
        assert_eq!(RecoverableSignature::from_slice(&raw(0, false)).unwrap().v, 27);
        assert_eq!(RecoverableSignature::from_slice(&raw(1, false)).unwrap().v, 28);
        assert_eq!(RecoverableSignature::from_slice(&raw(28, false)).unwrap().recovery_id(), 1);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            RecoverableSignature::from_slice(&[0u8; 64]),
            Err(SignatureError::InvalidLength(64))
        );
        assert_eq!(
            RecoverableSignature::from_slice(&raw(2, false)),
            Err(SignatureError::InvalidRecoveryId(2))
        );
        assert_eq!(
            RecoverableSignature::from_slice(&raw(27, true)),
            Err(SignatureError::MalleableS)
        );
    }

    #[test]
    fn bytes_round_trip() {
        let sig = RecoverableSignature::from_slice(&raw(27, false)).unwrap();
        assert_eq!(sig.to_bytes(), raw(27, false));
    }
}

//! Signer recovery through the `ecrecover` precompile.

use stylus_sdk::{
    alloy_primitives::{Address, FixedBytes},
    call::RawCall,
};

use sponsored_batch_types::RecoverableSignature;

use crate::constants::{ECRECOVER_GAS, ECRECOVER_PRECOMPILE};

/// Recover an EOA address from a 32-byte digest and a normalised signature.
///
/// The precompile returns empty output for an invalid signature and the zero address is never a
/// valid signer, so both map to `Err`.
pub fn ecrecover_address(
    digest: FixedBytes<32>,
    sig: &RecoverableSignature,
) -> Result<Address, ()> {
    let input = ecrecover_input(digest, sig);
    let out = unsafe {
        RawCall::new_static()
            .gas(ECRECOVER_GAS)
            .call(ECRECOVER_PRECOMPILE, &input)
    }
    .map_err(|_| ())?;
    if out.len() < 32 {
        return Err(());
    }
    // 32-byte word with the address in the low 20 bytes.
    let recovered = Address::from_slice(&out[12..32]);
    if recovered == Address::ZERO {
        return Err(());
    }
    Ok(recovered)
}

/// Precompile input: `digest || v (as a word) || r || s`.
pub fn ecrecover_input(digest: FixedBytes<32>, sig: &RecoverableSignature) -> [u8; 128] {
    let mut input = [0u8; 128];
    input[0..32].copy_from_slice(digest.as_slice());
    input[63] = sig.v;
    input[64..96].copy_from_slice(sig.r.as_slice());
    input[96..128].copy_from_slice(sig.s.as_slice());
    input
}

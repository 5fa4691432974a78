//! ABI conversion and signer recovery helpers.

pub mod abi;
pub mod crypto;

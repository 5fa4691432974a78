//! Compile-time configuration of the executor.

use stylus_sdk::alloy_primitives::{address, Address};

/// `ecrecover` precompile.
pub const ECRECOVER_PRECOMPILE: Address = address!("0000000000000000000000000000000000000001");

/// Gas forwarded to the `ecrecover` precompile (3000 is the fixed cost).
pub const ECRECOVER_GAS: u64 = 50_000;

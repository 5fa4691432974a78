//! Sponsored batch executor for EIP-7702 delegated accounts, as an Arbitrum Stylus contract.
//!
//! The protocol logic (digests, signature checks, replay counter, permit fallback, atomic
//! execution) lives in `sponsored-batch-types`; this crate supplies storage, the ABI surface and
//! an on-chain execution host.

#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]

extern crate alloc;

pub mod constants;
pub mod errors;
pub mod executor;
pub mod host;
pub mod utils;

pub use executor::SponsoredBatchExecutor;

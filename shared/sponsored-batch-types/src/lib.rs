//! Protocol core of the sponsored batch executor.
//!
//! Shared by the Stylus contract and the off-chain tooling: the batch data model, canonical
//! digests, signature normalisation, the replay counter, the permit adapter and the execution
//! engine. The environment is abstracted behind [`ExecutionHost`].

#![no_std]

extern crate alloc;

pub mod delegation;
pub mod encoding;
pub mod engine;
pub mod errors;
pub mod events;
pub mod host;
pub mod interfaces;
pub mod permit;
pub mod replay;
pub mod signature;
pub mod types;

pub use delegation::{read_delegation, DELEGATION_MARKER};
pub use encoding::{call_batch_digest, eth_signed_message_hash, permit_batch_digest};
pub use engine::{execute_permit_batch, execute_self, execute_sponsored, info};
pub use errors::{BatchError, SignatureError, UnrecognizedCode};
pub use events::{BatchEvent, BatchReceipt};
pub use host::{Checkpoint, ExecutionHost};
pub use permit::PermitOutcome;
pub use replay::{ExecutionLock, ExecutionState, ReplayGuard};
pub use signature::RecoverableSignature;
pub use types::{Call, PermitGrant, Phase, TransferInstruction, MAX_BATCH_SIZE};

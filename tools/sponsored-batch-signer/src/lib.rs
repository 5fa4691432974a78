//! Off-chain tooling for the sponsored batch executor: key handling and signing, EIP-2612 permit
//! digests, batch files, and an in-memory ledger to simulate batches against.

pub mod batch_file;
pub mod ledger;
pub mod permit;
pub mod signer;

pub use ledger::{Ledger, TransferReturn};
pub use permit::{permit_digest, sign_permit, PermitDomain, PermitMessage};
pub use signer::{address_of, recover, LocalSigner};

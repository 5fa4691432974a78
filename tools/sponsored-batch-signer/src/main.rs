use std::path::{Path, PathBuf};

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use sponsored_batch_signer::{
    batch_file::{BatchFile, CallEntry, PermitEntry, TransferEntry},
    permit::{sign_permit, PermitDomain, PermitMessage},
    LocalSigner,
};
use sponsored_batch_types::{
    call_batch_digest, delegation::is_delegated_to, eth_signed_message_hash, interfaces,
    permit_batch_digest, read_delegation, Call, PermitGrant, TransferInstruction,
};

/// Sign and inspect batches for the sponsored batch executor.
///
/// Output is JSON on stdout; logs go to stderr (`RUST_LOG`, default `info`).
#[derive(Parser, Debug)]
#[command(name = "batch-signer", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the address of a private key.
    Address {
        /// Private key (hex string, 0x...).
        #[arg(long, env = "SIGNER_PRIVATE_KEY")]
        private_key: String,
    },

    /// Print the batch digest and its signed-message wrapping.
    Digest {
        /// Call or permit batch JSON file.
        #[arg(long)]
        file: PathBuf,

        /// Replay counter the batch will be submitted at (`getInfo().nonce`).
        #[arg(long, default_value_t = U256::ZERO)]
        counter: U256,
    },

    /// Sign a batch file and print the signature plus ready-to-send calldata.
    Sign {
        #[arg(long, env = "SIGNER_PRIVATE_KEY")]
        private_key: String,

        #[arg(long)]
        file: PathBuf,

        #[arg(long, default_value_t = U256::ZERO)]
        counter: U256,

        /// Delegated account the call batch is for. Must be the signer for call batches.
        #[arg(long)]
        account: Option<Address>,
    },

    /// Sign an EIP-2612 permit naming the delegated account as spender.
    PermitSign {
        #[arg(long, env = "SIGNER_PRIVATE_KEY")]
        private_key: String,

        /// Permit token address (the EIP-712 verifying contract).
        #[arg(long)]
        token: Address,

        /// Token EIP-712 domain name.
        #[arg(long)]
        token_name: String,

        #[arg(long, default_value = "1")]
        token_version: String,

        #[arg(long, env = "CHAIN_ID", default_value_t = 1)]
        chain_id: u64,

        /// Delegated account that will pull the tokens.
        #[arg(long)]
        account: Address,

        #[arg(long)]
        value: U256,

        /// Owner's current permit nonce on the token.
        #[arg(long, default_value_t = U256::ZERO)]
        nonce: U256,

        /// Unix timestamp (inclusive).
        #[arg(long)]
        deadline: U256,
    },

    /// Decode account code as an EIP-7702 delegation designator.
    Delegation {
        /// Account code as hex (`0x` for none).
        #[arg(long)]
        code: String,

        /// Fail unless the code delegates to this executor address.
        #[arg(long)]
        expect: Option<Address>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Command::Address { private_key } => {
            let signer = LocalSigner::from_hex(&private_key)?;
            json!({ "address": signer.address() })
        }
        Command::Digest { file, counter } => {
            let digest = match BatchFile::load(&file)? {
                BatchFile::Calls { calls } => call_batch_digest(counter, &into_calls(calls)),
                BatchFile::Permits { permits, transfers } => {
                    let (permits, transfers) = into_permits(permits, transfers);
                    permit_batch_digest(counter, &permits, &transfers)
                }
            };
            json!({
                "counter": counter,
                "digest": digest,
                "signedMessageHash": eth_signed_message_hash(digest),
            })
        }
        Command::Sign {
            private_key,
            file,
            counter,
            account,
        } => sign_batch(&LocalSigner::from_hex(&private_key)?, &file, counter, account)?,
        Command::PermitSign {
            private_key,
            token,
            token_name,
            token_version,
            chain_id,
            account,
            value,
            nonce,
            deadline,
        } => {
            let signer = LocalSigner::from_hex(&private_key)?;
            let domain = PermitDomain {
                name: token_name,
                version: token_version,
                chain_id,
                verifying_contract: token,
            };
            let message = PermitMessage {
                owner: signer.address(),
                spender: account,
                value,
                nonce,
                deadline,
            };
            let grant = sign_permit(&signer, &domain, &message)?;
            tracing::info!(%token, owner = %signer.address(), %nonce, "signed permit");
            serde_json::to_value(PermitEntry::from(grant))?
        }
        Command::Delegation { code, expect } => inspect_delegation(&code, expect)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Decode account code and report its delegate, failing when it does not match `expect`.
fn inspect_delegation(code: &str, expect: Option<Address>) -> Result<serde_json::Value> {
    let raw = hex::decode(code.trim().trim_start_matches("0x"))
        .context("account code is not valid hex")?;
    let delegate = match read_delegation(&raw) {
        Ok(delegate) => delegate,
        Err(err) => bail!("{err}"),
    };
    if let Some(expected) = expect {
        if !is_delegated_to(&raw, expected) {
            bail!("account does not delegate to {expected} (delegate: {delegate:?})");
        }
    }
    Ok(json!({ "delegate": delegate }))
}

fn sign_batch(
    signer: &LocalSigner,
    file: &Path,
    counter: U256,
    account: Option<Address>,
) -> Result<serde_json::Value> {
    let batch = BatchFile::load(file)?;
    if batch.is_empty() {
        bail!("{} contains an empty batch", file.display());
    }

    let (signature, calldata) = match batch {
        BatchFile::Calls { calls } => {
            if let Some(account) = account.filter(|a| *a != signer.address()) {
                return Err(anyhow!(
                    "call batches must be signed by the account itself ({account}), not {}",
                    signer.address()
                ));
            }
            let calls = into_calls(calls);
            let signature = signer.sign_call_batch(counter, &calls)?.to_bytes();
            let calldata = interfaces::execute_sponsored_calldata(&calls, &signature);
            (signature, calldata)
        }
        BatchFile::Permits { permits, transfers } => {
            let (permits, transfers) = into_permits(permits, transfers);
            if permits.iter().any(|p| p.owner != signer.address()) {
                tracing::warn!(
                    signer = %signer.address(),
                    "signer is not the owner of every permit; the executor will reject this batch"
                );
            }
            let signature = signer
                .sign_permit_batch(counter, &permits, &transfers)?
                .to_bytes();
            let calldata =
                interfaces::execute_permit_batch_calldata(&permits, &transfers, &signature);
            (signature, calldata)
        }
    };

    tracing::info!(signer = %signer.address(), %counter, "signed batch");
    Ok(json!({
        "signer": signer.address(),
        "counter": counter,
        "signature": format!("0x{}", hex::encode(signature)),
        "calldata": format!("0x{}", hex::encode(calldata)),
    }))
}

fn into_calls(calls: Vec<CallEntry>) -> Vec<Call> {
    calls.into_iter().map(Call::from).collect()
}

fn into_permits(
    permits: Vec<PermitEntry>,
    transfers: Vec<TransferEntry>,
) -> (Vec<PermitGrant>, Vec<TransferInstruction>) {
    (
        permits.into_iter().map(PermitGrant::from).collect(),
        transfers.into_iter().map(TransferInstruction::from).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const DELEGATE: Address = address!("00000000000000000000000000000000000000de");

    #[test]
    fn delegation_matches_expected_delegate() {
        let code = "0xef010000000000000000000000000000000000000000de";
        let out = inspect_delegation(code, Some(DELEGATE)).unwrap();
        assert_eq!(out["delegate"], json!(DELEGATE));

        let other = address!("00000000000000000000000000000000000000df");
        assert!(inspect_delegation(code, Some(other)).is_err());
        assert!(inspect_delegation("0x", Some(DELEGATE)).is_err());
        assert_eq!(inspect_delegation("0x", None).unwrap()["delegate"], json!(null));
        assert!(inspect_delegation("0x6080", None).is_err());
    }
}

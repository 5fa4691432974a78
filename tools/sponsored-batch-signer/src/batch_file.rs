//! JSON batch files consumed by the CLI.
//!
//! A call batch is `{ "calls": [...] }`; a permit batch is `{ "permits": [...], "transfers": [...] }`.
//! Quantities are hex strings (`"0x2a"`), byte strings are `0x`-prefixed hex.

use std::{fs, path::Path};

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sponsored_batch_types::{Call, PermitGrant, TransferInstruction};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEntry {
    pub target: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitEntry {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub deadline: U256,
    pub v: u8,
    pub r: FixedBytes<32>,
    pub s: FixedBytes<32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEntry {
    pub token: Address,
    pub to: Address,
    pub amount: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchFile {
    Calls {
        calls: Vec<CallEntry>,
    },
    Permits {
        permits: Vec<PermitEntry>,
        transfers: Vec<TransferEntry>,
    },
}

impl BatchFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read batch file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a call or permit batch", path.display()))
    }

    pub fn len(&self) -> usize {
        match self {
            BatchFile::Calls { calls } => calls.len(),
            BatchFile::Permits { permits, .. } => permits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<CallEntry> for Call {
    fn from(e: CallEntry) -> Self {
        Call::new(e.target, e.value, e.data)
    }
}

impl From<PermitEntry> for PermitGrant {
    fn from(e: PermitEntry) -> Self {
        PermitGrant {
            token: e.token,
            owner: e.owner,
            spender: e.spender,
            value: e.value,
            deadline: e.deadline,
            v: e.v,
            r: e.r,
            s: e.s,
        }
    }
}

impl From<PermitGrant> for PermitEntry {
    fn from(p: PermitGrant) -> Self {
        PermitEntry {
            token: p.token,
            owner: p.owner,
            spender: p.spender,
            value: p.value,
            deadline: p.deadline,
            v: p.v,
            r: p.r,
            s: p.s,
        }
    }
}

impl From<TransferEntry> for TransferInstruction {
    fn from(e: TransferEntry) -> Self {
        TransferInstruction {
            token: e.token,
            to: e.to,
            amount: e.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn parses_call_batches() {
        let raw = r#"{
            "calls": [
                { "target": "0x00000000000000000000000000000000000000c1", "value": "0x2a", "data": "0xdeadbeef" },
                { "target": "0x00000000000000000000000000000000000000c2" }
            ]
        }"#;
        let file: BatchFile = serde_json::from_str(raw).unwrap();
        let BatchFile::Calls { calls } = file else {
            panic!("expected a call batch");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].value, U256::from(42u64));
        assert_eq!(calls[0].data, Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(calls[1].value, U256::ZERO);
        assert!(calls[1].data.is_empty());
    }

    #[test]
    fn parses_permit_batches() {
        let raw = r#"{
            "permits": [{
                "token": "0x00000000000000000000000000000000000000f1",
                "owner": "0x00000000000000000000000000000000000000b1",
                "spender": "0x00000000000000000000000000000000000000aa",
                "value": "0x64",
                "deadline": "0xffffffff",
                "v": 27,
                "r": "0x0101010101010101010101010101010101010101010101010101010101010101",
                "s": "0x0202020202020202020202020202020202020202020202020202020202020202"
            }],
            "transfers": [{
                "token": "0x00000000000000000000000000000000000000f1",
                "to": "0x00000000000000000000000000000000000000d1",
                "amount": "0x64"
            }]
        }"#;
        let file: BatchFile = serde_json::from_str(raw).unwrap();
        assert_eq!(file.len(), 1);
        let BatchFile::Permits { permits, transfers } = file else {
            panic!("expected a permit batch");
        };
        let grant = PermitGrant::from(permits[0].clone());
        assert_eq!(grant.owner, address!("00000000000000000000000000000000000000b1"));
        assert_eq!(grant.r, FixedBytes::repeat_byte(0x01));
        assert_eq!(TransferInstruction::from(transfers[0].clone()).amount, U256::from(100u64));
    }
}

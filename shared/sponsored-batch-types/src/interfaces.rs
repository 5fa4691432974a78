//! Solidity ABI: the token surface the executor drives, and the executor's own surface.

use alloc::vec::Vec;

use alloy_sol_types::sol;

use crate::types::{Call, PermitGrant, TransferInstruction};

sol! {
    /// ERC-20 with EIP-2612 permits.
    interface IERC20Permit {
        function permit(
            address owner,
            address spender,
            uint256 value,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function transferFrom(address from, address to, uint256 amount) external returns (bool success);
        function transfer(address to, uint256 amount) external returns (bool success);
        function approve(address spender, uint256 amount) external returns (bool success);
        function balanceOf(address account) external view returns (uint256 balance);
        function nonces(address owner) external view returns (uint256 nonce);
    }

    event ItemExecuted(uint256 indexed index, address indexed target, uint256 value, bytes data);
    event TokenSaved(address indexed token, address indexed from, address indexed to, uint256 amount);
    event BatchCommitted(uint256 indexed nonce, uint256 itemCount, address indexed invoker);

    struct BatchCall {
        address target;
        uint256 value;
        bytes data;
    }

    struct BatchPermit {
        address token;
        address owner;
        address spender;
        uint256 value;
        uint256 deadline;
        uint8 v;
        bytes32 r;
        bytes32 s;
    }

    struct BatchTransfer {
        address token;
        address to;
        uint256 amount;
    }

    /// External surface of the executor, for sponsors building calldata.
    interface ISponsoredBatchExecutor {
        function executeSelf(BatchCall[] calls) external payable;
        function executeSponsored(BatchCall[] calls, bytes signature) external payable;
        function executePermitBatch(
            BatchPermit[] permits,
            BatchTransfer[] transfers,
            bytes signature
        ) external;
        function getInfo() external view returns (uint256 nonce, uint256 maxBatchSize);
    }
}

impl From<&Call> for BatchCall {
    fn from(call: &Call) -> Self {
        Self {
            target: call.target,
            value: call.value,
            data: call.payload.clone(),
        }
    }
}

impl From<&PermitGrant> for BatchPermit {
    fn from(p: &PermitGrant) -> Self {
        Self {
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

impl From<&TransferInstruction> for BatchTransfer {
    fn from(t: &TransferInstruction) -> Self {
        Self {
            token: t.token,
            to: t.to,
            amount: t.amount,
        }
    }
}

/// Calldata for `executeSponsored(calls, signature)`.
pub fn execute_sponsored_calldata(calls: &[Call], signature: &[u8]) -> Vec<u8> {
    use alloy_sol_types::SolCall;
    ISponsoredBatchExecutor::executeSponsoredCall {
        calls: calls.iter().map(BatchCall::from).collect(),
        signature: signature.to_vec().into(),
    }
    .abi_encode()
}

/// Calldata for `executePermitBatch(permits, transfers, signature)`.
pub fn execute_permit_batch_calldata(
    permits: &[PermitGrant],
    transfers: &[TransferInstruction],
    signature: &[u8],
) -> Vec<u8> {
    use alloy_sol_types::SolCall;
    ISponsoredBatchExecutor::executePermitBatchCall {
        permits: permits.iter().map(BatchPermit::from).collect(),
        transfers: transfers.iter().map(BatchTransfer::from).collect(),
        signature: signature.to_vec().into(),
    }
    .abi_encode()
}

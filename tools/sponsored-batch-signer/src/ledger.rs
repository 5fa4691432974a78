//! In-memory ledger implementing [`ExecutionHost`], for simulating batches off-chain.
//!
//! Holds native balances, account code and a set of EIP-2612 permit tokens. Tokens verify permit
//! signatures for real, consume per-owner nonces and return strict ERC-20 results, so a batch
//! behaves here the way it would against deployed tokens. State changes are journaled: a
//! checkpoint snapshots the world and a revert restores it.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::{Revert, SolCall, SolError, SolInterface};

use sponsored_batch_types::{
    interfaces::IERC20Permit::{self, IERC20PermitCalls},
    read_delegation, Checkpoint, ExecutionHost, RecoverableSignature, UnrecognizedCode,
};

use crate::{
    permit::{permit_digest, PermitDomain, PermitMessage},
    signer,
};

/// How a simulated token reports a successful `transfer`/`transferFrom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferReturn {
    /// ABI-encoded `true`.
    #[default]
    Bool,
    /// Empty return data, like pre-standard tokens.
    Empty,
}

#[derive(Clone, Debug)]
struct Token {
    name: String,
    version: String,
    transfer_return: TransferReturn,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    nonces: HashMap<Address, U256>,
}

impl Token {
    fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn nonce(&self, owner: Address) -> U256 {
        self.nonces.get(&owner).copied().unwrap_or_default()
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        self.balances.insert(from, available - amount);
        let credited = self.balance_of(to) + amount;
        self.balances.insert(to, credited);
        Ok(())
    }

    fn transfer_result(&self) -> Vec<u8> {
        match self.transfer_return {
            TransferReturn::Bool => IERC20Permit::transferCall::abi_encode_returns(&(true,)),
            TransferReturn::Empty => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct World {
    native: HashMap<Address, U256>,
    code: HashMap<Address, Vec<u8>>,
    tokens: HashMap<Address, Token>,
}

impl World {
    fn native_balance(&self, addr: Address) -> U256 {
        self.native.get(&addr).copied().unwrap_or_default()
    }

    fn move_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.native_balance(from);
        if available < amount {
            return Err(revert("insufficient native balance"));
        }
        self.native.insert(from, available - amount);
        let credited = self.native_balance(to) + amount;
        self.native.insert(to, credited);
        Ok(())
    }
}

/// Simulated chain state seen from one delegated account.
#[derive(Debug)]
pub struct Ledger {
    chain_id: u64,
    account: Address,
    caller: Address,
    value: U256,
    now: u64,
    world: World,
    journal: Vec<World>,
    failing: HashSet<Address>,
}

impl Ledger {
    pub fn new(chain_id: u64, account: Address) -> Self {
        Self {
            chain_id,
            account,
            caller: account,
            value: U256::ZERO,
            now: 0,
            world: World::default(),
            journal: Vec::new(),
            failing: HashSet::new(),
        }
    }

    pub fn set_timestamp(&mut self, now: u64) {
        self.now = now;
    }

    /// Start an invocation from `caller` carrying `value`. The value moves to the account before
    /// the batch runs, as it does for a payable entry point.
    pub fn invoke_from(&mut self, caller: Address, value: U256) -> Result<(), Vec<u8>> {
        self.world.move_native(caller, self.account, value)?;
        self.caller = caller;
        self.value = value;
        tracing::debug!(%caller, %value, "invocation");
        Ok(())
    }

    pub fn fund(&mut self, addr: Address, amount: U256) {
        let credited = self.world.native_balance(addr) + amount;
        self.world.native.insert(addr, credited);
    }

    pub fn native_balance(&self, addr: Address) -> U256 {
        self.world.native_balance(addr)
    }

    pub fn set_code(&mut self, addr: Address, code: Vec<u8>) {
        self.world.code.insert(addr, code);
    }

    pub fn code(&self, addr: Address) -> &[u8] {
        self.world.code.get(&addr).map(Vec::as_slice).unwrap_or_default()
    }

    /// The delegate `addr` currently points at, per its code.
    pub fn delegate_of(&self, addr: Address) -> Result<Option<Address>, UnrecognizedCode> {
        read_delegation(self.code(addr))
    }

    /// Deploy a permit token at `addr`.
    pub fn deploy_token(&mut self, addr: Address, name: &str, transfer_return: TransferReturn) {
        self.world.tokens.insert(
            addr,
            Token {
                name: name.to_string(),
                version: "1".to_string(),
                transfer_return,
                balances: HashMap::new(),
                allowances: HashMap::new(),
                nonces: HashMap::new(),
            },
        );
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        if let Some(t) = self.world.tokens.get_mut(&token) {
            let credited = t.balance_of(to) + amount;
            t.balances.insert(to, credited);
        }
    }

    /// Set an allowance directly, as if `owner` had approved `spender` earlier.
    pub fn set_allowance(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        if let Some(t) = self.world.tokens.get_mut(&token) {
            t.allowances.insert((owner, spender), amount);
        }
    }

    pub fn token_balance(&self, token: Address, owner: Address) -> U256 {
        self.world
            .tokens
            .get(&token)
            .map(|t| t.balance_of(owner))
            .unwrap_or_default()
    }

    pub fn token_allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.world
            .tokens
            .get(&token)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or_default()
    }

    pub fn permit_nonce(&self, token: Address, owner: Address) -> U256 {
        self.world
            .tokens
            .get(&token)
            .map(|t| t.nonce(owner))
            .unwrap_or_default()
    }

    /// EIP-712 domain the token at `token` verifies permits against.
    pub fn permit_domain(&self, token: Address) -> Option<PermitDomain> {
        self.world.tokens.get(&token).map(|t| PermitDomain {
            name: t.name.clone(),
            version: t.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: token,
        })
    }

    /// Make every call to `target` revert.
    pub fn fail_calls_to(&mut self, target: Address) {
        self.failing.insert(target);
    }

    fn dispatch(&mut self, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        if self.failing.contains(&target) {
            return Err(revert("call target reverted"));
        }
        self.world.move_native(self.account, target, value)?;
        if self.world.tokens.contains_key(&target) {
            return self.token_call(target, data);
        }
        Ok(Vec::new())
    }

    fn token_call(&mut self, token: Address, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let sender = self.account;
        let call = IERC20PermitCalls::abi_decode(data, true)
            .map_err(|_| revert("unknown token function"))?;
        let domain = self.permit_domain(token);
        let now = self.now;
        let t = self
            .world
            .tokens
            .get_mut(&token)
            .ok_or_else(|| revert("no token"))?;

        match call {
            IERC20PermitCalls::permit(p) => {
                let domain = domain.ok_or_else(|| revert("no token"))?;
                if p.deadline < U256::from(now) {
                    return Err(revert("ERC20Permit: expired deadline"));
                }
                let message = PermitMessage {
                    owner: p.owner,
                    spender: p.spender,
                    value: p.value,
                    nonce: t.nonce(p.owner),
                    deadline: p.deadline,
                };
                let recovered = RecoverableSignature::from_parts(p.r, p.s, p.v)
                    .ok()
                    .and_then(|sig| signer::recover(permit_digest(&domain, &message), &sig));
                if recovered != Some(p.owner) {
                    return Err(revert("ERC20Permit: invalid signature"));
                }
                t.nonces.insert(p.owner, message.nonce + U256::from(1u64));
                t.allowances.insert((p.owner, p.spender), p.value);
                Ok(Vec::new())
            }
            IERC20PermitCalls::transferFrom(c) => {
                let allowed = t.allowance(c.from, sender);
                if allowed < c.amount {
                    return Err(revert("ERC20: insufficient allowance"));
                }
                t.move_balance(c.from, c.to, c.amount)?;
                if allowed != U256::MAX {
                    t.allowances.insert((c.from, sender), allowed - c.amount);
                }
                Ok(t.transfer_result())
            }
            IERC20PermitCalls::transfer(c) => {
                t.move_balance(sender, c.to, c.amount)?;
                Ok(t.transfer_result())
            }
            IERC20PermitCalls::approve(c) => {
                t.allowances.insert((sender, c.spender), c.amount);
                Ok(IERC20Permit::approveCall::abi_encode_returns(&(true,)))
            }
            IERC20PermitCalls::allowance(c) => Ok(IERC20Permit::allowanceCall::abi_encode_returns(
                &(t.allowance(c.owner, c.spender),),
            )),
            IERC20PermitCalls::balanceOf(c) => Ok(IERC20Permit::balanceOfCall::abi_encode_returns(
                &(t.balance_of(c.account),),
            )),
            IERC20PermitCalls::nonces(c) => Ok(IERC20Permit::noncesCall::abi_encode_returns(&(
                t.nonce(c.owner),
            ),)),
        }
    }

    fn token_view(&self, token: Address, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let t = self.world.tokens.get(&token).ok_or_else(Vec::new)?;
        match IERC20PermitCalls::abi_decode(data, true) {
            Ok(IERC20PermitCalls::allowance(c)) => Ok(IERC20Permit::allowanceCall::abi_encode_returns(
                &(t.allowance(c.owner, c.spender),),
            )),
            Ok(IERC20PermitCalls::balanceOf(c)) => Ok(IERC20Permit::balanceOfCall::abi_encode_returns(
                &(t.balance_of(c.account),),
            )),
            Ok(IERC20PermitCalls::nonces(c)) => {
                Ok(IERC20Permit::noncesCall::abi_encode_returns(&(t.nonce(c.owner),)))
            }
            _ => Err(revert("state change in static call")),
        }
    }
}

impl ExecutionHost for Ledger {
    fn account(&self) -> Address {
        self.account
    }

    fn caller(&self) -> Address {
        self.caller
    }

    fn call_value(&self) -> U256 {
        self.value
    }

    fn block_timestamp(&self) -> u64 {
        self.now
    }

    fn ecrecover(&self, digest: FixedBytes<32>, signature: &RecoverableSignature) -> Option<Address> {
        signer::recover(digest, signature)
    }

    fn call(&mut self, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let result = self.dispatch(target, value, data);
        match &result {
            Ok(_) => tracing::debug!(%target, %value, len = data.len(), "call"),
            Err(_) => tracing::info!(%target, %value, len = data.len(), "call reverted"),
        }
        result
    }

    fn static_call(&self, target: Address, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        if self.failing.contains(&target) {
            return Err(revert("call target reverted"));
        }
        self.token_view(target, data)
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.journal.push(self.world.clone());
        Checkpoint(self.journal.len() - 1)
    }

    fn checkpoint_commit(&mut self, checkpoint: Checkpoint) {
        self.journal.truncate(checkpoint.0);
    }

    fn checkpoint_revert(&mut self, checkpoint: Checkpoint) {
        if let Some(saved) = self.journal.drain(checkpoint.0..).next() {
            tracing::info!(depth = checkpoint.0, "reverting to checkpoint");
            self.world = saved;
        }
    }
}

/// ABI-encoded `Error(string)` revert data.
fn revert(reason: &str) -> Vec<u8> {
    Revert {
        reason: reason.to_string(),
    }
    .abi_encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");
    const TOKEN: Address = address!("00000000000000000000000000000000000000f1");
    const ALICE: Address = address!("00000000000000000000000000000000000000a1");

    #[test]
    fn checkpoint_revert_restores_balances() {
        let mut ledger = Ledger::new(1, ACCOUNT);
        ledger.fund(ACCOUNT, U256::from(10u64));

        let cp = ledger.checkpoint();
        ledger.call(ALICE, U256::from(4u64), &[]).unwrap();
        assert_eq!(ledger.native_balance(ALICE), U256::from(4u64));

        ledger.checkpoint_revert(cp);
        assert_eq!(ledger.native_balance(ALICE), U256::ZERO);
        assert_eq!(ledger.native_balance(ACCOUNT), U256::from(10u64));
    }

    #[test]
    fn checkpoint_commit_keeps_changes() {
        let mut ledger = Ledger::new(1, ACCOUNT);
        ledger.fund(ACCOUNT, U256::from(10u64));

        let cp = ledger.checkpoint();
        ledger.call(ALICE, U256::from(4u64), &[]).unwrap();
        ledger.checkpoint_commit(cp);
        assert_eq!(ledger.native_balance(ALICE), U256::from(4u64));
    }

    #[test]
    fn failing_targets_revert_with_reason() {
        let mut ledger = Ledger::new(1, ACCOUNT);
        ledger.fail_calls_to(ALICE);

        let err = ledger.call(ALICE, U256::ZERO, &[]).unwrap_err();
        let reason = Revert::abi_decode(&err, true).unwrap();
        assert_eq!(reason.reason, "call target reverted");
    }

    #[test]
    fn transfer_from_needs_allowance() {
        let mut ledger = Ledger::new(1, ACCOUNT);
        ledger.deploy_token(TOKEN, "Token", TransferReturn::Bool);
        ledger.mint(TOKEN, ALICE, U256::from(100u64));

        let data = IERC20Permit::transferFromCall {
            from: ALICE,
            to: ACCOUNT,
            amount: U256::from(5u64),
        }
        .abi_encode();
        assert!(ledger.call(TOKEN, U256::ZERO, &data).is_err());

        ledger.set_allowance(TOKEN, ALICE, ACCOUNT, U256::from(5u64));
        let out = ledger.call(TOKEN, U256::ZERO, &data).unwrap();
        assert!(IERC20Permit::transferFromCall::abi_decode_returns(&out, true).unwrap().success);
        assert_eq!(ledger.token_balance(TOKEN, ACCOUNT), U256::from(5u64));
        assert_eq!(ledger.token_allowance(TOKEN, ALICE, ACCOUNT), U256::ZERO);
    }

    #[test]
    fn reads_delegation_from_code() {
        let mut ledger = Ledger::new(1, ACCOUNT);
        assert_eq!(ledger.delegate_of(ACCOUNT), Ok(None));

        ledger.set_code(ACCOUNT, sponsored_batch_types::delegation::delegation_code(ALICE).to_vec());
        assert_eq!(ledger.delegate_of(ACCOUNT), Ok(Some(ALICE)));
    }
}

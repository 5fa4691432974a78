//! Replay counter and the per-instance execution lock.

use core::ops::{Deref, DerefMut};

use alloy_primitives::U256;

use crate::errors::BatchError;

/// Single monotonically increasing counter binding each signature to one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayGuard {
    counter: U256,
}

impl ReplayGuard {
    pub const fn new() -> Self {
        Self {
            counter: U256::ZERO,
        }
    }

    /// Resume from a persisted counter value.
    pub const fn from_counter(counter: U256) -> Self {
        Self { counter }
    }

    pub fn snapshot(&self) -> U256 {
        self.counter
    }

    /// Advance by one and return the value that was consumed.
    pub fn advance(&mut self) -> U256 {
        let used = self.counter;
        self.counter = used.saturating_add(U256::from(1u64));
        used
    }
}

/// Mutable state owned by one executor instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionState {
    pub replay: ReplayGuard,
    executing: bool,
}

impl ExecutionState {
    pub const fn new(replay: ReplayGuard) -> Self {
        Self {
            replay,
            executing: false,
        }
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Take the execution lock. It is released when the returned guard drops, on every path.
    pub fn enter(&mut self) -> Result<ExecutionLock<'_>, BatchError> {
        if self.executing {
            return Err(BatchError::Reentrancy);
        }
        self.executing = true;
        Ok(ExecutionLock { state: self })
    }
}

/// Held for the duration of one batch.
#[derive(Debug)]
pub struct ExecutionLock<'a> {
    state: &'a mut ExecutionState,
}

impl Deref for ExecutionLock<'_> {
    type Target = ExecutionState;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ExecutionLock<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

impl Drop for ExecutionLock<'_> {
    fn drop(&mut self) {
        self.state.executing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_returns_consumed_value() {
        let mut guard = ReplayGuard::new();
        assert_eq!(guard.advance(), U256::ZERO);
        assert_eq!(guard.advance(), U256::from(1u64));
        assert_eq!(guard.snapshot(), U256::from(2u64));
    }

    #[test]
    fn lock_rejects_reentry_and_releases_on_drop() {
        let mut state = ExecutionState::default();
        {
            let mut lock = state.enter().unwrap();
            assert!(lock.is_executing());
            assert_eq!(lock.enter().unwrap_err(), BatchError::Reentrancy);
            lock.replay.advance();
        }
        assert!(!state.is_executing());
        assert_eq!(state.replay.snapshot(), U256::from(1u64));
        assert!(state.enter().is_ok());
    }

    #[test]
    fn lock_releases_on_early_return() {
        fn failing(state: &mut ExecutionState) -> Result<(), BatchError> {
            let _lock = state.enter()?;
            Err(BatchError::InvalidSignature)
        }

        let mut state = ExecutionState::default();
        assert!(failing(&mut state).is_err());
        assert!(!state.is_executing());
    }
}

//! The state a fee module transition operates on.
//!
//! A transition runs against a branch of [`ChainState`] and the branch is
//! written back only if the whole transition succeeds. Callers therefore
//! observe either every write of a transition or none of them.

use feeibc_types::Result;

use crate::{Bank, BankKeeper, KvStore, MemoryStore};

/// Escrow record store plus ledger.
#[derive(Debug, Clone, Default)]
pub struct ChainState<S = MemoryStore, B = Bank> {
    pub store: S,
    pub bank: B,
}

impl<S, B> ChainState<S, B>
where
    S: KvStore + Clone,
    B: BankKeeper + Clone,
{
    #[must_use]
    pub fn new(store: S, bank: B) -> Self {
        Self { store, bank }
    }

    /// Run `transition` on a branch of the state and commit it only if it
    /// returns `Ok`. On error the state is left exactly as it was.
    pub fn run_atomic<T>(&mut self, transition: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut branch = self.clone();
        let out = transition(&mut branch)?;
        *self = branch;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeibc_types::{AccAddress, Coins, FeeError};
    use rust_decimal::Decimal;

    #[test]
    fn failed_transition_discards_writes() {
        let mut state = ChainState::<MemoryStore, Bank>::default();
        let (a, b) = (AccAddress::random(), AccAddress::random());
        let ten = Coins::one("stake", Decimal::new(10, 0)).unwrap();
        state.bank.mint(&a, &ten).unwrap();

        let err = state
            .run_atomic(|s| {
                s.store.set(b"k".to_vec(), b"v".to_vec());
                s.bank.send_coins(&a, &b, &ten)?;
                Err::<(), _>(FeeError::Internal("abort".into()))
            })
            .unwrap_err();
        assert!(matches!(err, FeeError::Internal(_)));
        assert!(state.store.is_empty());
        assert_eq!(state.bank.all_balances(&a), ten);
        assert!(state.bank.all_balances(&b).is_empty());
    }

    #[test]
    fn successful_transition_commits() {
        let mut state = ChainState::<MemoryStore, Bank>::default();
        let out = state
            .run_atomic(|s| {
                s.store.set(b"k".to_vec(), b"v".to_vec());
                Ok(7)
            })
            .unwrap();
        assert_eq!(out, 7);
        assert_eq!(state.store.get(b"k"), Some(b"v".to_vec()));
    }
}

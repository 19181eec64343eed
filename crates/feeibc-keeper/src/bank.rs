//! Account balances.
//!
//! [`BankKeeper`] is the ledger capability the fee module is handed; it
//! never reaches for a global. [`Bank`] is the in-memory ledger used by
//! the state machine in this workspace.
//!
//! Every transfer is atomic: either all denominations move or the
//! balances are unchanged.

use std::collections::{BTreeMap, HashMap};

use feeibc_types::{AccAddress, Coin, Coins, FeeError, Result};

/// Ledger operations the fee module consumes.
pub trait BankKeeper {
    /// Address of a registered module account.
    fn module_address(&self, module: &str) -> Result<AccAddress>;

    /// Balance of one denomination; a zero coin when nothing is held.
    fn balance(&self, address: &AccAddress, denom: &str) -> Coin;

    /// All non-zero balances of an account.
    fn all_balances(&self, address: &AccAddress) -> Coins;

    /// Move coins between two accounts.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if `from` lacks any denomination.
    fn send_coins(&mut self, from: &AccAddress, to: &AccAddress, amount: &Coins) -> Result<()>;

    /// Move coins out of a module account.
    fn send_coins_from_module_to_account(
        &mut self,
        module: &str,
        to: &AccAddress,
        amount: &Coins,
    ) -> Result<()> {
        let from = self.module_address(module)?;
        self.send_coins(&from, to, amount)
    }

    /// Move coins into a module account.
    fn send_coins_from_account_to_module(
        &mut self,
        from: &AccAddress,
        module: &str,
        amount: &Coins,
    ) -> Result<()> {
        let to = self.module_address(module)?;
        self.send_coins(from, &to, amount)
    }
}

/// In-memory ledger with per-account coin balances and module accounts.
#[derive(Debug, Clone, Default)]
pub struct Bank {
    /// Per-account balances. Accounts with nothing are not stored.
    balances: BTreeMap<AccAddress, Coins>,
    /// Registered module accounts by name.
    modules: HashMap<String, AccAddress>,
}

impl Bank {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module account and return its address.
    pub fn register_module(&mut self, name: &str) -> AccAddress {
        self.modules
            .entry(name.to_string())
            .or_insert_with(|| AccAddress::module(name))
            .clone()
    }

    /// Create new coins in an account (genesis / test funding).
    pub fn mint(&mut self, to: &AccAddress, amount: &Coins) -> Result<()> {
        let balance = self.all_balances(to).checked_add(amount)?;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    fn insufficient(from: &AccAddress, held: &Coins, amount: &Coins) -> FeeError {
        let (denom, needed) = amount
            .iter()
            .find(|(denom, needed)| held.amount_of(denom) < **needed)
            .map(|(denom, needed)| (denom.clone(), *needed))
            .unwrap_or_default();
        FeeError::InsufficientFunds {
            address: from.clone(),
            available: held.amount_of(&denom),
            denom,
            needed,
        }
    }
}

impl BankKeeper for Bank {
    fn module_address(&self, module: &str) -> Result<AccAddress> {
        self.modules
            .get(module)
            .cloned()
            .ok_or_else(|| FeeError::UnknownModuleAccount(module.to_string()))
    }

    fn balance(&self, address: &AccAddress, denom: &str) -> Coin {
        Coin {
            denom: denom.to_string(),
            amount: self
                .balances
                .get(address)
                .map(|coins| coins.amount_of(denom))
                .unwrap_or_default(),
        }
    }

    fn all_balances(&self, address: &AccAddress) -> Coins {
        self.balances.get(address).cloned().unwrap_or_default()
    }

    fn send_coins(&mut self, from: &AccAddress, to: &AccAddress, amount: &Coins) -> Result<()> {
        if amount.is_empty() {
            return Ok(());
        }

        let held = self.all_balances(from);
        let from_after = held
            .checked_sub(amount)
            .map_err(|_| Self::insufficient(from, &held, amount))?;

        // Compute both sides before writing anything.
        let to_after = if from == to {
            held
        } else {
            self.all_balances(to).checked_add(amount)?
        };

        if from != to {
            if from_after.is_empty() {
                self.balances.remove(from);
            } else {
                self.balances.insert(from.clone(), from_after);
            }
        }
        self.balances.insert(to.clone(), to_after);
        Ok(())
    }
}

//! Escrow accounting check.
//!
//! Invariant after any settlement or migration:
//! ```text
//! ∀ denom: module_balance(denom) ≥ Σ_records rule.escrow_total(fee)(denom)
//! ```
//!
//! If the module account holds less than the records say it should, some
//! fee can no longer be paid out. The upgrade runs this check only when
//! `MigrationConfig::verify_escrow_after_migration` is set.

use feeibc_keeper::{BankKeeper, FeeKeeper, KvStore};
use feeibc_types::{Coins, FeeError, IdentifiedPacketFees, Result};
use rust_decimal::Decimal;

use crate::rule::SettlementRule;

/// Per-denomination escrow totals required by a set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscrowAccounting {
    required: Coins,
    records: usize,
}

impl EscrowAccounting {
    /// Tally the given records under `rule`.
    pub fn tally<'a>(
        records: impl IntoIterator<Item = &'a IdentifiedPacketFees>,
        rule: &impl SettlementRule,
    ) -> Result<Self> {
        let mut accounting = Self::default();
        for entry in records {
            accounting.add(entry, rule)?;
        }
        Ok(accounting)
    }

    /// Tally every record in the store under `rule`.
    pub fn from_store(
        keeper: &FeeKeeper,
        store: &impl KvStore,
        rule: &impl SettlementRule,
    ) -> Result<Self> {
        let mut accounting = Self::default();
        for entry in keeper.iter_identified_packet_fees(store) {
            accounting.add(&entry?, rule)?;
        }
        Ok(accounting)
    }

    fn add(&mut self, entry: &IdentifiedPacketFees, rule: &impl SettlementRule) -> Result<()> {
        for packet_fee in &entry.packet_fees {
            self.required = self
                .required
                .checked_add(&rule.escrow_total(&packet_fee.fee))?;
            self.records += 1;
        }
        Ok(())
    }

    /// Total the records require.
    #[must_use]
    pub fn required(&self) -> &Coins {
        &self.required
    }

    #[must_use]
    pub fn required_of(&self, denom: &str) -> Decimal {
        self.required.amount_of(denom)
    }

    /// Number of fees tallied.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Verify that `held` covers every required denomination.
    ///
    /// # Errors
    /// Returns [`FeeError::EscrowUnderfunded`] for the first short denom.
    pub fn verify_covered(&self, held: &Coins) -> Result<()> {
        for (denom, required) in &self.required {
            let available = held.amount_of(denom);
            if available < *required {
                return Err(FeeError::EscrowUnderfunded {
                    denom: denom.clone(),
                    required: *required,
                    held: available,
                });
            }
        }
        Ok(())
    }

    /// Verify against the keeper's module account balance.
    pub fn verify_module_balance(&self, keeper: &FeeKeeper, bank: &impl BankKeeper) -> Result<()> {
        self.verify_covered(&bank.all_balances(keeper.module_address()))
    }
}

//! Consensus version 1 → 2 escrow migration.
//!
//! Version 1 escrowed `recv + ack + timeout` per fee; version 2 only keeps
//! what [`SettlementRule::escrow_total`] says can ever be paid out. For
//! every escrowed fee the difference goes back to its refund address:
//!
//! ```text
//! for each packet in feesInEscrow/*:
//!     for each fee offered on the packet:
//!         excess = legacy_total(fee) - rule.escrow_total(fee)   (per denom, > 0 only)
//!         module account ──excess──▶ refund address
//! ```
//!
//! The store is only read. Transfers are issued as records are visited;
//! the caller runs the migration on a state branch so a failure part way
//! through leaves nothing behind (see [`crate::UpgradeHandler`]).

use feeibc_keeper::{BankKeeper, FeeKeeper, KvStore};
use feeibc_types::{Coins, FeeError, IdentifiedPacketFees, PacketFee, Result};
use serde::Serialize;

use crate::legacy::legacy_total;
use crate::rule::{ExclusiveOutcome, SettlementRule};

/// What a migration run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Packets with an escrow record.
    pub packets: usize,
    /// Fees visited across all packets.
    pub records: usize,
    /// Fees that had an excess refunded.
    pub refunds: usize,
    /// Sum of every refund.
    pub refunded: Coins,
}

/// Refunds the excess escrow left by the version 1 rule.
#[derive(Debug, Clone)]
pub struct Migrator<'k, R = ExclusiveOutcome> {
    keeper: &'k FeeKeeper,
    rule: R,
}

impl<'k> Migrator<'k> {
    /// Migrator using the exclusive-outcome rule.
    #[must_use]
    pub fn new(keeper: &'k FeeKeeper) -> Self {
        Self::with_rule(keeper, ExclusiveOutcome)
    }
}

impl<'k, R: SettlementRule> Migrator<'k, R> {
    #[must_use]
    pub fn with_rule(keeper: &'k FeeKeeper, rule: R) -> Self {
        Self { keeper, rule }
    }

    #[must_use]
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Refund `legacy_total - escrow_total` of every escrowed fee.
    ///
    /// # Errors
    /// - `InvalidAddress` if a refund address does not resolve
    /// - `RefundFailed` wrapping the ledger error if a transfer fails
    /// - `MalformedKey` / `Serialization` for an unreadable record
    ///
    /// Nothing is rolled back here; transfers already issued stay issued.
    pub fn migrate_1_to_2(
        &self,
        store: &impl KvStore,
        bank: &mut impl BankKeeper,
    ) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for entry in self.keeper.iter_identified_packet_fees(store) {
            let entry = entry?;
            report.packets += 1;
            for packet_fee in &entry.packet_fees {
                report.records += 1;
                if let Some(refunded) = self.refund_excess(bank, &entry, packet_fee)? {
                    report.refunds += 1;
                    report.refunded = report.refunded.checked_add(&refunded)?;
                }
            }
        }

        tracing::info!(
            packets = report.packets,
            records = report.records,
            refunds = report.refunds,
            refunded = %report.refunded,
            "Escrow migration 1 -> 2 complete"
        );
        Ok(report)
    }

    /// Refund one fee's excess. Returns the refunded coins, or `None`
    /// if nothing was owed.
    fn refund_excess(
        &self,
        bank: &mut impl BankKeeper,
        entry: &IdentifiedPacketFees,
        packet_fee: &PacketFee,
    ) -> Result<Option<Coins>> {
        let refund_address = self.keeper.resolve_address(&packet_fee.refund_address)?;

        let legacy = legacy_total(&packet_fee.fee);
        let corrected = self.rule.escrow_total(&packet_fee.fee);
        if !legacy.is_all_gte(&corrected) {
            tracing::warn!(
                packet = %entry.packet_id,
                legacy = %legacy,
                corrected = %corrected,
                "Settlement rule reserves more than was escrowed"
            );
        }

        let excess = legacy.saturating_sub(&corrected);
        if excess.is_empty() {
            return Ok(None);
        }

        self.keeper
            .distribute_fee_to_address(bank, &refund_address, &excess)
            .map_err(|source| FeeError::RefundFailed {
                packet_id: entry.packet_id.clone(),
                refund_address: refund_address.clone(),
                coins: excess.clone(),
                source: Box::new(source),
            })?;

        tracing::debug!(
            packet = %entry.packet_id,
            refund_address = %packet_fee.refund_address,
            excess = %excess,
            "Excess escrow refunded"
        );
        Ok(Some(excess))
    }
}

//! Settlement rules: how much of a fee must stay in escrow.

use feeibc_types::{Coins, Fee};

use crate::legacy::legacy_total;

/// Amount a fee needs reserved in escrow until its packet completes.
pub trait SettlementRule {
    fn escrow_total(&self, fee: &Fee) -> Coins;
}

impl<R: SettlementRule + ?Sized> SettlementRule for &R {
    fn escrow_total(&self, fee: &Fee) -> Coins {
        (**self).escrow_total(fee)
    }
}

/// A packet is either acknowledged or timed out, never both, so only the
/// larger of `recv_fee + ack_fee` and `timeout_fee` is ever paid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusiveOutcome;

impl SettlementRule for ExclusiveOutcome {
    fn escrow_total(&self, fee: &Fee) -> Coins {
        fee.total()
    }
}

/// Consensus version 1: every component reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyCombined;

impl SettlementRule for LegacyCombined {
    fn escrow_total(&self, fee: &Fee) -> Coins {
        legacy_total(fee)
    }
}

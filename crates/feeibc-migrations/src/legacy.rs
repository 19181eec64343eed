//! Escrow total under the pre-migration rule.
//!
//! Consensus version 1 reserved every fee component at once:
//!
//! ```text
//! legacy_total = recv_fee + ack_fee + timeout_fee
//! ```

use feeibc_types::{Coins, Fee};

/// Denomination-wise sum of all three fee components.
#[must_use]
pub fn legacy_total(fee: &Fee) -> Coins {
    fee.recv_fee.add(&fee.ack_fee).add(&fee.timeout_fee)
}

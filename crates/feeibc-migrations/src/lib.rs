//! # feeibc-migrations
//!
//! Store migrations of the relayer fee module.
//!
//! Consensus version 1 escrowed `recv_fee + ack_fee + timeout_fee` for every
//! fee. Only one of the two outcomes of a packet is ever paid, so version 2
//! escrows `max(recv_fee + ack_fee, timeout_fee)` and the difference is
//! returned to each fee's refund address.
//!
//! - [`legacy_total`]: what version 1 escrowed
//! - [`SettlementRule`]: what must stay escrowed ([`ExclusiveOutcome`] by default)
//! - [`Migrator`]: refunds the excess, one transfer per fee
//! - [`EscrowAccounting`]: the module account still covers every record
//! - [`UpgradeHandler`]: version gate, atomic branch, version bump

pub mod escrow_accounting;
pub mod legacy;
pub mod migrator;
pub mod rule;
pub mod upgrade;

pub use escrow_accounting::EscrowAccounting;
pub use legacy::legacy_total;
pub use migrator::{MigrationReport, Migrator};
pub use rule::{ExclusiveOutcome, LegacyCombined, SettlementRule};
pub use upgrade::{UpgradeHandler, UpgradeOutcome, consensus_version, set_consensus_version};

//! # feeibc-keeper
//!
//! **Escrow plane** of the relayer fee module: where fee records live and
//! where escrowed funds are held.
//!
//! ## Architecture
//!
//! 1. **KvStore / MemoryStore**: byte-keyed store holding escrow records
//! 2. **BankKeeper / Bank**: ledger capability moving coins between accounts
//! 3. **FeeKeeper**: escrows packet fees, enumerates records, pays them out
//! 4. **ChainState**: store + ledger, with all-or-nothing transitions
//!
//! ## Fee Flow
//!
//! ```text
//! payer → escrow_packet_fee() → module account + feesInEscrow/{packet}
//!       → ack / timeout → distribute_packet_fees_on_*() → relayers + payer
//! ```

pub mod bank;
pub mod keeper;
pub mod state;
pub mod store;

pub use bank::{Bank, BankKeeper};
pub use keeper::FeeKeeper;
pub use state::ChainState;
pub use store::{KvStore, MemoryStore};

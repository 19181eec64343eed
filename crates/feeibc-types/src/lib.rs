//! # feeibc-types
//!
//! Shared types, errors, and configuration for the **relayer fee escrow**
//! module.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PortId`], [`ChannelId`], [`Sequence`], [`PacketId`]
//! - **Coin model**: [`Coin`], [`Coins`]
//! - **Fee model**: [`Fee`], [`PacketFee`], [`PacketFees`], [`IdentifiedPacketFees`]
//! - **Accounts**: [`AccAddress`]
//! - **Configuration**: [`FeeModuleConfig`], [`MigrationConfig`]
//! - **Errors**: [`FeeError`] with `FEE_ERR_` prefix codes
//! - **Constants**: module name, store layout, consensus versions, limits

pub mod address;
pub mod coin;
pub mod config;
pub mod constants;
pub mod error;
pub mod fee;
pub mod ids;

// Re-export all primary types at crate root for ergonomic imports:
//   use feeibc_types::{Coins, Fee, PacketFee, PacketId, ...};

pub use address::*;
pub use coin::*;
pub use config::*;
pub use error::*;
pub use fee::*;
pub use ids::*;

// Constants are accessed via `feeibc_types::constants::FOO`
// (not re-exported to avoid name collisions).

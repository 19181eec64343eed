//! System-wide constants for the relayer fee module.

use rust_decimal::Decimal;

/// Name of the fee module. Also the preimage of its escrow account address.
pub const MODULE_NAME: &str = "feeibc";

/// Store key prefix under which escrowed packet fees are persisted.
pub const FEES_IN_ESCROW_PREFIX: &str = "feesInEscrow";

/// Store key holding the module's consensus version.
pub const CONSENSUS_VERSION_KEY: &str = "consensusVersion";

/// Consensus version before the escrow refund migration.
pub const LEGACY_CONSENSUS_VERSION: u64 = 1;

/// Current consensus version of the fee module.
pub const CONSENSUS_VERSION: u64 = 2;

/// Default bech32 human-readable prefix for account addresses.
pub const DEFAULT_BECH32_PREFIX: &str = "cosmos";

/// Default staking denomination (used by fixtures and examples).
pub const DEFAULT_BOND_DENOM: &str = "stake";

/// Length in bytes of account and module addresses.
pub const ADDRESS_LEN: usize = 20;

/// Maximum length in bytes of any account address.
pub const MAX_ADDRESS_LEN: usize = 255;

/// Minimum / maximum length of a denomination.
pub const MIN_DENOM_LEN: usize = 3;
pub const MAX_DENOM_LEN: usize = 128;

/// Identifier length bounds (ICS-24).
pub const MIN_PORT_ID_LEN: usize = 2;
pub const MAX_PORT_ID_LEN: usize = 128;
pub const MIN_CHANNEL_ID_LEN: usize = 8;
pub const MAX_CHANNEL_ID_LEN: usize = 64;

/// Largest amount a single coin may carry (10^27).
///
/// `Decimal::MAX` is roughly 7.9 * 10^28, so the sum of any few bounded
/// amounts stays representable.
pub const MAX_COIN_AMOUNT: Decimal = Decimal::from_parts(3_892_314_112, 2_681_241_660, 54_210_108, false, 0);

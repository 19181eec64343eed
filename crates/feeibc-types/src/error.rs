//! Error types for the relayer fee module.
//!
//! All errors use the `FEE_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Identifier and address errors
//! - 2xx: Coin and balance errors
//! - 3xx: Fee and escrow errors
//! - 4xx: Store / codec errors
//! - 5xx: Migration and upgrade errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccAddress, Coins, PacketId};

/// Central error enum for all fee module operations.
#[derive(Debug, Error)]
pub enum FeeError {
    // =================================================================
    // Identifier / Address Errors (1xx)
    // =================================================================
    /// A port or channel identifier failed ICS-24 validation.
    #[error("FEE_ERR_100: Invalid identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// A string could not be resolved into an account address.
    #[error("FEE_ERR_101: Invalid account address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    // =================================================================
    // Coin / Balance Errors (2xx)
    // =================================================================
    /// The denomination does not match `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
    #[error("FEE_ERR_200: Invalid denomination: {0:?}")]
    InvalidDenom(String),

    /// The amount is negative, fractional or too large.
    #[error("FEE_ERR_201: Invalid amount {amount} for {denom}: {reason}")]
    InvalidAmount {
        denom: String,
        amount: Decimal,
        reason: String,
    },

    /// The same denomination appears twice in a coin list.
    #[error("FEE_ERR_202: Duplicate denomination: {0}")]
    DuplicateDenom(String),

    /// An account does not hold enough of a denomination.
    #[error("FEE_ERR_203: Insufficient funds in {address} for {denom}: need {needed}, have {available}")]
    InsufficientFunds {
        address: AccAddress,
        denom: String,
        needed: Decimal,
        available: Decimal,
    },

    /// Coin addition overflowed.
    #[error("FEE_ERR_204: Coin amount overflow for {denom}")]
    CoinOverflow { denom: String },

    /// Coin subtraction would produce a negative amount.
    #[error("FEE_ERR_205: Negative coin amount for {denom}")]
    CoinUnderflow { denom: String },

    /// No module account is registered under this name.
    #[error("FEE_ERR_206: Unknown module account: {0}")]
    UnknownModuleAccount(String),

    // =================================================================
    // Fee / Escrow Errors (3xx)
    // =================================================================
    /// The fee failed validation.
    #[error("FEE_ERR_300: Invalid fee: {reason}")]
    InvalidFee { reason: String },

    /// The relayers field is reserved and must be empty.
    #[error("FEE_ERR_301: Relayers must be empty, got {count}")]
    RelayersNotEmpty { count: usize },

    /// No fees are escrowed for the packet.
    #[error("FEE_ERR_302: No fees in escrow for packet {0}")]
    FeeNotFound(PacketId),

    /// The module account holds less than the escrow records require.
    #[error("FEE_ERR_303: Escrow underfunded for {denom}: required {required}, held {held}")]
    EscrowUnderfunded {
        denom: String,
        required: Decimal,
        held: Decimal,
    },

    // =================================================================
    // Store / Codec Errors (4xx)
    // =================================================================
    /// A store key does not follow the expected layout.
    #[error("FEE_ERR_400: Malformed store key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    /// Serialization / deserialization error.
    #[error("FEE_ERR_401: Serialization error: {0}")]
    Serialization(String),

    // =================================================================
    // Migration / Upgrade Errors (5xx)
    // =================================================================
    /// Returning excess escrow to a refund address failed.
    #[error("FEE_ERR_500: Refund of {coins} to {refund_address} for packet {packet_id} failed: {source}")]
    RefundFailed {
        packet_id: PacketId,
        refund_address: AccAddress,
        coins: Coins,
        #[source]
        source: Box<FeeError>,
    },

    /// The stored consensus version has no known migration path.
    #[error("FEE_ERR_501: Unsupported consensus version {found}, current is {current}")]
    UnsupportedConsensusVersion { found: u64, current: u64 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FEE_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (missing or malformed values).
    #[error("FEE_ERR_901: Configuration error: {0}")]
    Configuration(String),
}

impl FeeError {
    /// Whether this error, or the error it wraps, is an insufficient-funds error.
    #[must_use]
    pub fn is_insufficient_funds(&self) -> bool {
        match self {
            Self::InsufficientFunds { .. } => true,
            Self::RefundFailed { source, .. } => source.is_insufficient_funds(),
            _ => false,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FeeError>;

impl From<serde_json::Error> for FeeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

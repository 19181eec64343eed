//! Relayer incentive fees attached to packets.
//!
//! A payer attaches a [`Fee`] to a packet; the fee is escrowed by the fee
//! module until the packet is acknowledged or times out, at which point it
//! is paid to relayers and the unused remainder is returned to the refund
//! address.
//!
//! ```text
//!   recv_fee     → forward relayer     (packet received)
//!   ack_fee      → reverse relayer     (acknowledgement relayed)
//!   timeout_fee  → timeout relayer     (packet timed out)
//! ```
//!
//! A packet is either received and acknowledged, or it times out. The
//! amount that must stay in escrow is therefore
//! `max(recv_fee + ack_fee, timeout_fee)`, see [`Fee::total`].

use serde::{Deserialize, Serialize};

use crate::{AccAddress, Coins, FeeError, PacketId, Result};

/// Fee offered for relaying one packet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Paid to the relayer that delivers the packet.
    pub recv_fee: Coins,
    /// Paid to the relayer that delivers the acknowledgement.
    pub ack_fee: Coins,
    /// Paid to the relayer that delivers the timeout.
    pub timeout_fee: Coins,
}

impl Fee {
    #[must_use]
    pub fn new(recv_fee: Coins, ack_fee: Coins, timeout_fee: Coins) -> Self {
        Self {
            recv_fee,
            ack_fee,
            timeout_fee,
        }
    }

    /// Amount that must be held in escrow for this fee:
    /// `max(recv_fee + ack_fee, timeout_fee)`, denomination-wise.
    #[must_use]
    pub fn total(&self) -> Coins {
        self.recv_fee.add(&self.ack_fee).max(&self.timeout_fee)
    }

    /// A fee must carry at least one non-empty component.
    ///
    /// Component coin sets are valid by construction.
    pub fn validate(&self) -> Result<()> {
        if self.recv_fee.is_empty() && self.ack_fee.is_empty() && self.timeout_fee.is_empty() {
            return Err(FeeError::InvalidFee {
                reason: "all fee components are empty".into(),
            });
        }
        Ok(())
    }
}

/// One fee offer attached to a packet by one payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketFee {
    pub fee: Fee,
    /// Bech32 address that receives unused fees.
    pub refund_address: String,
    /// Relayers permitted to claim the fee. Empty means any relayer.
    #[serde(default)]
    pub relayers: Vec<String>,
}

impl PacketFee {
    #[must_use]
    pub fn new(fee: Fee, refund_address: impl Into<String>, relayers: Vec<String>) -> Self {
        Self {
            fee,
            refund_address: refund_address.into(),
            relayers,
        }
    }

    /// Resolve the stored refund address.
    pub fn refund_account(&self, bech32_prefix: &str) -> Result<AccAddress> {
        AccAddress::from_bech32(&self.refund_address, bech32_prefix)
    }

    /// Validate the refund address and the fee. The relayers field is
    /// reserved and must be empty for new escrows.
    pub fn validate(&self, bech32_prefix: &str) -> Result<()> {
        self.refund_account(bech32_prefix)?;
        if !self.relayers.is_empty() {
            return Err(FeeError::RelayersNotEmpty {
                count: self.relayers.len(),
            });
        }
        self.fee.validate()
    }
}

/// All fee offers escrowed for a single packet, in escrow order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketFees {
    pub packet_fees: Vec<PacketFee>,
}

impl PacketFees {
    #[must_use]
    pub fn new(packet_fees: Vec<PacketFee>) -> Self {
        Self { packet_fees }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packet_fees.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packet_fees.len()
    }
}

/// A packet id together with every fee escrowed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedPacketFees {
    pub packet_id: PacketId,
    pub packet_fees: Vec<PacketFee>,
}

impl IdentifiedPacketFees {
    #[must_use]
    pub fn new(packet_id: PacketId, packet_fees: Vec<PacketFee>) -> Self {
        Self {
            packet_id,
            packet_fees,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Fee {
    /// 100 / 200 / 300 of the bond denom for recv / ack / timeout.
    pub fn dummy() -> Self {
        Self::uniform_parts(crate::constants::DEFAULT_BOND_DENOM, 100, 200, 300)
    }

    /// Single-denom fee with the given component amounts.
    pub fn uniform_parts(denom: &str, recv: i64, ack: i64, timeout: i64) -> Self {
        use rust_decimal::Decimal;
        let c = |n: i64| Coins::one(denom, Decimal::new(n, 0)).expect("valid fixture coin");
        Self::new(c(recv), c(ack), c(timeout))
    }
}

//! Fee keeper: escrows packet fees and pays them out.
//!
//! Escrowing moves [`Fee::total`] from the payer into the module account
//! and appends the fee to the packet's record. When the packet completes,
//! the record is settled in one of two ways:
//!
//! - **acknowledged**: `recv_fee` to the forward relayer, `ack_fee` to the
//!   reverse relayer, remainder of the escrow back to the payer
//! - **timed out**: `timeout_fee` to the timeout relayer, remainder back
//!   to the payer
//!
//! and the record is deleted. Every payout of a record is resolved and
//! checked against the escrow account before the first coin moves, so a
//! settlement either pays everyone or no one.

use feeibc_types::{
    AccAddress, Coins, FeeError, FeeModuleConfig, IdentifiedPacketFees, PacketFee, PacketFees,
    PacketId, Result,
};

use crate::bank::BankKeeper;
use crate::store::{self, KvStore};

/// Access to the fee module's escrow records and escrow account.
#[derive(Debug, Clone)]
pub struct FeeKeeper {
    config: FeeModuleConfig,
    module_address: AccAddress,
}

impl FeeKeeper {
    /// Create a keeper for the given module configuration.
    ///
    /// # Errors
    /// Returns `Configuration` if the config fails validation.
    pub fn new(config: FeeModuleConfig) -> Result<Self> {
        config.validate()?;
        let module_address = config.module_address();
        Ok(Self {
            config,
            module_address,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FeeModuleConfig {
        &self.config
    }

    /// Name of the module account holding escrowed fees.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.config.module_name
    }

    /// Address of the module account holding escrowed fees.
    #[must_use]
    pub fn module_address(&self) -> &AccAddress {
        &self.module_address
    }

    /// Resolve a stored bech32 address with this chain's prefix.
    pub fn resolve_address(&self, address: &str) -> Result<AccAddress> {
        AccAddress::from_bech32(address, &self.config.bech32_prefix)
    }

    // -----------------------------------------------------------------
    // Escrow records
    // -----------------------------------------------------------------

    /// Fees escrowed for a packet, if any.
    pub fn get_fees_in_escrow(
        &self,
        store: &impl KvStore,
        packet_id: &PacketId,
    ) -> Result<Option<PacketFees>> {
        store
            .get(&store::fees_in_escrow_key(packet_id))
            .map(|bytes| serde_json::from_slice(&bytes).map_err(FeeError::from))
            .transpose()
    }

    #[must_use]
    pub fn has_fees_in_escrow(&self, store: &impl KvStore, packet_id: &PacketId) -> bool {
        store.has(&store::fees_in_escrow_key(packet_id))
    }

    /// Overwrite the record for a packet.
    pub fn set_fees_in_escrow(
        &self,
        store: &mut impl KvStore,
        packet_id: &PacketId,
        fees: &PacketFees,
    ) -> Result<()> {
        let value = serde_json::to_vec(fees)?;
        store.set(store::fees_in_escrow_key(packet_id), value);
        Ok(())
    }

    pub fn delete_fees_in_escrow(&self, store: &mut impl KvStore, packet_id: &PacketId) {
        store.delete(&store::fees_in_escrow_key(packet_id));
    }

    /// Lazily walk every escrow record in key order.
    ///
    /// Each item is decoded on demand; a malformed key or value yields an
    /// `Err` for that item.
    pub fn iter_identified_packet_fees<'a, S: KvStore>(
        &self,
        store: &'a S,
    ) -> impl Iterator<Item = Result<IdentifiedPacketFees>> + 'a {
        store
            .prefix_iter(&store::fees_in_escrow_prefix())
            .map(|(key, value)| {
                let packet_id = store::parse_fees_in_escrow_key(key)?;
                let fees: PacketFees = serde_json::from_slice(value)?;
                Ok(IdentifiedPacketFees::new(packet_id, fees.packet_fees))
            })
    }

    /// Every escrow record, collected.
    pub fn get_all_identified_packet_fees(
        &self,
        store: &impl KvStore,
    ) -> Result<Vec<IdentifiedPacketFees>> {
        self.iter_identified_packet_fees(store).collect()
    }

    // -----------------------------------------------------------------
    // Funds
    // -----------------------------------------------------------------

    /// Escrow a fee for a packet: move `fee.total()` from the refund
    /// account into the module account and append the fee to the record.
    ///
    /// # Errors
    /// - `InvalidAddress`, `RelayersNotEmpty`, `InvalidFee` on validation
    /// - `InsufficientFunds` if the payer cannot cover the total
    pub fn escrow_packet_fee(
        &self,
        store: &mut impl KvStore,
        bank: &mut impl BankKeeper,
        packet_id: &PacketId,
        packet_fee: PacketFee,
    ) -> Result<()> {
        packet_id.validate()?;
        packet_fee.validate(&self.config.bech32_prefix)?;
        let payer = self.resolve_address(&packet_fee.refund_address)?;
        let total = packet_fee.fee.total();

        bank.send_coins_from_account_to_module(&payer, self.module_name(), &total)?;

        let payer_bech32 = packet_fee.refund_address.clone();
        let mut fees = self.get_fees_in_escrow(&*store, packet_id)?.unwrap_or_default();
        fees.packet_fees.push(packet_fee);
        self.set_fees_in_escrow(store, packet_id, &fees)?;

        tracing::debug!(
            packet = %packet_id,
            payer = %payer_bech32,
            escrowed = %total,
            offers = fees.len(),
            "Packet fee escrowed"
        );
        Ok(())
    }

    /// Pay coins out of the escrow account.
    pub fn distribute_fee_to_address(
        &self,
        bank: &mut impl BankKeeper,
        receiver: &AccAddress,
        fee: &Coins,
    ) -> Result<()> {
        bank.send_coins_from_module_to_account(self.module_name(), receiver, fee)
    }

    /// Settle every fee of an acknowledged packet and delete its record.
    ///
    /// # Errors
    /// - `FeeNotFound` if nothing is escrowed for the packet
    /// - `InvalidAddress` if any refund address does not resolve
    /// - `EscrowUnderfunded` if the escrow account cannot cover every payout
    ///
    /// On error no coins move and the record is kept.
    pub fn distribute_packet_fees_on_acknowledgement(
        &self,
        store: &mut impl KvStore,
        bank: &mut impl BankKeeper,
        packet_id: &PacketId,
        forward_relayer: &AccAddress,
        reverse_relayer: &AccAddress,
    ) -> Result<()> {
        let fees = self
            .get_fees_in_escrow(&*store, packet_id)?
            .ok_or_else(|| FeeError::FeeNotFound(packet_id.clone()))?;

        let mut payouts = Vec::with_capacity(fees.len() * 3);
        for packet_fee in &fees.packet_fees {
            let refund = self.resolve_address(&packet_fee.refund_address)?;
            let fee = &packet_fee.fee;
            let unused = fee.total().saturating_sub(&fee.recv_fee.add(&fee.ack_fee));
            payouts.push((forward_relayer.clone(), fee.recv_fee.clone()));
            payouts.push((reverse_relayer.clone(), fee.ack_fee.clone()));
            payouts.push((refund, unused));
        }

        self.pay_out(bank, &payouts)?;
        self.delete_fees_in_escrow(store, packet_id);
        tracing::debug!(
            packet = %packet_id,
            offers = fees.len(),
            "Packet fees paid on acknowledgement"
        );
        Ok(())
    }

    /// Settle every fee of a timed-out packet and delete its record.
    ///
    /// Fails, without moving coins, under the same conditions as
    /// [`FeeKeeper::distribute_packet_fees_on_acknowledgement`].
    pub fn distribute_packet_fees_on_timeout(
        &self,
        store: &mut impl KvStore,
        bank: &mut impl BankKeeper,
        packet_id: &PacketId,
        timeout_relayer: &AccAddress,
    ) -> Result<()> {
        let fees = self
            .get_fees_in_escrow(&*store, packet_id)?
            .ok_or_else(|| FeeError::FeeNotFound(packet_id.clone()))?;

        let mut payouts = Vec::with_capacity(fees.len() * 2);
        for packet_fee in &fees.packet_fees {
            let refund = self.resolve_address(&packet_fee.refund_address)?;
            let fee = &packet_fee.fee;
            let unused = fee.total().saturating_sub(&fee.timeout_fee);
            payouts.push((timeout_relayer.clone(), fee.timeout_fee.clone()));
            payouts.push((refund, unused));
        }

        self.pay_out(bank, &payouts)?;
        self.delete_fees_in_escrow(store, packet_id);
        tracing::debug!(packet = %packet_id, offers = fees.len(), "Packet fees paid on timeout");
        Ok(())
    }

    /// Check that the escrow account covers the sum of `payouts`, then
    /// make them.
    fn pay_out(&self, bank: &mut impl BankKeeper, payouts: &[(AccAddress, Coins)]) -> Result<()> {
        let mut required = Coins::new();
        for (_, coins) in payouts {
            required = required.checked_add(coins)?;
        }

        let held = bank.all_balances(&bank.module_address(self.module_name())?);
        if let Some((denom, needed)) = required
            .iter()
            .find(|(denom, needed)| held.amount_of(denom) < **needed)
        {
            return Err(FeeError::EscrowUnderfunded {
                denom: denom.clone(),
                required: *needed,
                held: held.amount_of(denom),
            });
        }

        for (receiver, coins) in payouts {
            self.distribute_fee_to_address(bank, receiver, coins)?;
        }
        Ok(())
    }
}

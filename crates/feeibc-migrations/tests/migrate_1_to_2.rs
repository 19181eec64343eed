//! Escrow migration scenarios against a full chain state.
//!
//! Each test seeds the store the way consensus version 1 left it (every fee
//! escrowed at `recv + ack + timeout`) and runs the upgrade end to end:
//! version gate, refunds, escrow accounting, version bump.

use feeibc_keeper::{Bank, BankKeeper, ChainState, FeeKeeper, KvStore, MemoryStore};
use feeibc_migrations::{
    LegacyCombined, MigrationReport, Migrator, SettlementRule, UpgradeHandler, UpgradeOutcome,
    consensus_version, legacy_total,
};
use feeibc_types::*;
use rust_decimal::Decimal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn coins(denom: &str, n: i64) -> Coins {
    Coins::one(denom, Decimal::new(n, 0)).unwrap()
}

fn packet(seq: u64) -> PacketId {
    PacketId::new("transfer", "channel-0", seq).unwrap()
}

/// Chain at consensus version 1 with a funded payer.
struct LegacyChain {
    keeper: FeeKeeper,
    state: ChainState,
    payer: AccAddress,
}

impl LegacyChain {
    fn new() -> Self {
        init_tracing();
        let keeper = FeeKeeper::new(FeeModuleConfig::default()).unwrap();
        let mut state = ChainState::<MemoryStore, Bank>::default();
        state.bank.register_module(keeper.module_name());
        let payer = AccAddress::random();
        state
            .bank
            .mint(&payer, &coins("stake", 1_000_000).add(&coins("denom", 1_000_000)))
            .unwrap();
        Self {
            keeper,
            state,
            payer,
        }
    }

    fn payer_bech32(&self) -> String {
        self.payer.to_bech32("cosmos").unwrap()
    }

    /// Escrow `fees` for a packet under the version 1 rule.
    fn escrow_legacy(&mut self, packet_id: &PacketId, fees: &[Fee]) {
        let refund = self.payer_bech32();
        self.escrow_legacy_as(packet_id, fees, &refund);
    }

    fn escrow_legacy_as(&mut self, packet_id: &PacketId, fees: &[Fee], refund_address: &str) {
        let mut record = self
            .keeper
            .get_fees_in_escrow(&self.state.store, packet_id)
            .unwrap()
            .unwrap_or_default();
        for fee in fees {
            self.state
                .bank
                .send_coins_from_account_to_module(
                    &self.payer,
                    self.keeper.module_name(),
                    &legacy_total(fee),
                )
                .unwrap();
            record
                .packet_fees
                .push(PacketFee::new(fee.clone(), refund_address, vec![]));
        }
        self.keeper
            .set_fees_in_escrow(&mut self.state.store, packet_id, &record)
            .unwrap();
    }

    fn handler(&self) -> UpgradeHandler {
        UpgradeHandler::new(self.keeper.clone(), MigrationConfig::default())
    }

    fn upgrade(&mut self) -> Result<UpgradeOutcome> {
        self.handler().run_migrations(&mut self.state)
    }

    fn module_balance(&self) -> Coins {
        self.state.bank.all_balances(self.keeper.module_address())
    }

    fn payer_balance(&self, denom: &str) -> Decimal {
        self.state.bank.balance(&self.payer, denom).amount
    }

    fn report(outcome: UpgradeOutcome) -> MigrationReport {
        match outcome {
            UpgradeOutcome::Migrated(report) => report,
            UpgradeOutcome::AlreadyCurrent => panic!("expected a migration"),
        }
    }
}

// ---------------------------------------------------------------------------
// Refund amounts
// ---------------------------------------------------------------------------

#[test]
fn empty_escrow_only_bumps_version() {
    let mut chain = LegacyChain::new();
    let before = chain.state.bank.clone();

    let report = LegacyChain::report(chain.upgrade().unwrap());

    assert_eq!(report, MigrationReport::default());
    assert_eq!(chain.state.bank.all_balances(&chain.payer), before.all_balances(&chain.payer));
    assert!(chain.module_balance().is_empty());
    assert!(
        chain
            .keeper
            .get_all_identified_packet_fees(&chain.state.store)
            .unwrap()
            .is_empty()
    );
    assert_eq!(consensus_version(&chain.state.store).unwrap(), 2);
}

#[test]
fn single_record_refunds_timeout_overlap() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);
    let stored_before = chain.keeper.get_all_identified_packet_fees(&chain.state.store).unwrap();
    assert_eq!(chain.module_balance(), coins("stake", 600));
    let payer_before = chain.payer_balance("stake");

    let report = LegacyChain::report(chain.upgrade().unwrap());

    assert_eq!(report.refunds, 1);
    assert_eq!(report.refunded, coins("stake", 300));
    assert_eq!(chain.payer_balance("stake"), payer_before + Decimal::new(300, 0));
    assert_eq!(chain.module_balance(), coins("stake", 300));
    // Records are left as they were.
    assert_eq!(
        chain.keeper.get_all_identified_packet_fees(&chain.state.store).unwrap(),
        stored_before
    );
}

#[test]
fn multiple_records_and_denoms_are_independent() {
    let mut chain = LegacyChain::new();
    let fee1 = Fee::dummy();
    let fee2 = Fee::uniform_parts("denom", 100, 100, 100);
    chain.escrow_legacy(&packet(1), &[fee1.clone(), fee2, fee1]);

    let stake_before = chain.payer_balance("stake");
    let denom_before = chain.payer_balance("denom");

    let report = LegacyChain::report(chain.upgrade().unwrap());

    assert_eq!(report.packets, 1);
    assert_eq!(report.records, 3);
    assert_eq!(report.refunds, 3);
    assert_eq!(
        report.refunded,
        coins("stake", 600).add(&coins("denom", 100))
    );
    assert_eq!(chain.payer_balance("stake"), stake_before + Decimal::new(600, 0));
    assert_eq!(chain.payer_balance("denom"), denom_before + Decimal::new(100, 0));
    assert_eq!(
        chain.module_balance(),
        coins("stake", 600).add(&coins("denom", 200))
    );
    assert_eq!(
        chain
            .keeper
            .get_fees_in_escrow(&chain.state.store, &packet(1))
            .unwrap()
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn records_across_channels_and_refund_addresses() {
    let mut chain = LegacyChain::new();
    let other = AccAddress::random();
    let other_bech32 = other.to_bech32("cosmos").unwrap();

    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);
    chain.escrow_legacy_as(
        &PacketId::new("transfer", "channel-7", 3).unwrap(),
        &[Fee::uniform_parts("stake", 10, 10, 50)],
        &other_bech32,
    );

    let report = LegacyChain::report(chain.upgrade().unwrap());

    assert_eq!(report.packets, 2);
    // 10 + 10 + 50 escrowed, max(20, 50) kept
    assert_eq!(chain.state.bank.all_balances(&other), coins("stake", 20));
    assert_eq!(report.refunded, coins("stake", 320));
    assert_eq!(chain.module_balance(), coins("stake", 350));
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[test]
fn invalid_refund_address_moves_nothing() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);
    chain.escrow_legacy_as(&packet(2), &[Fee::dummy()], "osmo1notours");

    let bank_before = chain.state.bank.clone();
    let store_before = chain.state.store.clone();

    let err = chain.upgrade().unwrap_err();

    assert!(matches!(err, FeeError::InvalidAddress { .. }), "{err}");
    // The refund for packet 1 was issued on the branch, never committed.
    assert_eq!(
        chain.state.bank.all_balances(&chain.payer),
        bank_before.all_balances(&chain.payer)
    );
    assert_eq!(chain.module_balance(), coins("stake", 1200));
    assert_eq!(chain.state.store, store_before);
    assert_eq!(consensus_version(&chain.state.store).unwrap(), 1);
}

#[test]
fn insufficient_module_balance_wraps_and_rolls_back() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);
    chain.escrow_legacy(&packet(2), &[Fee::dummy()]);
    // Leak 1000 out of the module: 200 left, second refund of 300 fails.
    let sink = AccAddress::random();
    chain
        .state
        .bank
        .send_coins(chain.keeper.module_address(), &sink, &coins("stake", 1000))
        .unwrap();
    let payer_before = chain.payer_balance("stake");

    let err = chain.upgrade().unwrap_err();

    assert!(err.is_insufficient_funds());
    match &err {
        FeeError::RefundFailed {
            packet_id, coins: c, ..
        } => {
            assert_eq!(packet_id, &packet(1));
            assert_eq!(c, &coins("stake", 300));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(chain.payer_balance("stake"), payer_before);
    assert_eq!(chain.module_balance(), coins("stake", 200));
}

/// Two version 1 fees (600 each) with only 900 left in the module account.
fn short_module_chain() -> LegacyChain {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy(), Fee::dummy()]);
    chain
        .state
        .bank
        .send_coins(chain.keeper.module_address(), &AccAddress::random(), &coins("stake", 300))
        .unwrap();
    chain
}

#[test]
fn payable_refunds_succeed_on_short_module() {
    let mut chain = short_module_chain();
    let payer_before = chain.payer_balance("stake");

    let report = LegacyChain::report(chain.upgrade().unwrap());

    assert_eq!(report.refunded, coins("stake", 600));
    assert_eq!(chain.payer_balance("stake"), payer_before + Decimal::new(600, 0));
    assert_eq!(chain.module_balance(), coins("stake", 300));
    assert_eq!(consensus_version(&chain.state.store).unwrap(), 2);
}

#[test]
fn opt_in_escrow_check_rejects_underfunded_result() {
    let mut chain = short_module_chain();
    let handler = UpgradeHandler::new(
        chain.keeper.clone(),
        MigrationConfig {
            verify_escrow_after_migration: true,
        },
    );

    // Refunds of 600 are payable, but 300 left < 600 required.
    let err = handler.run_migrations(&mut chain.state).unwrap_err();
    assert!(
        matches!(
            &err,
            FeeError::EscrowUnderfunded { denom, .. } if denom == "stake"
        ),
        "{err}"
    );
    assert_eq!(chain.module_balance(), coins("stake", 900));
    assert_eq!(consensus_version(&chain.state.store).unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn second_upgrade_is_noop() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);

    chain.upgrade().unwrap();
    let bank_after = chain.state.bank.clone();
    let store_after = chain.state.store.clone();

    assert_eq!(chain.upgrade().unwrap(), UpgradeOutcome::AlreadyCurrent);
    assert_eq!(chain.state.store, store_after);
    assert_eq!(
        chain.state.bank.all_balances(&chain.payer),
        bank_after.all_balances(&chain.payer)
    );
    assert_eq!(chain.module_balance(), coins("stake", 300));
}

#[test]
fn raw_migrator_is_not_idempotent() {
    // Only the version gate makes re-runs safe; the migrator itself
    // refunds again on every call.
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);
    let migrator = Migrator::new(&chain.keeper);

    migrator
        .migrate_1_to_2(&chain.state.store, &mut chain.state.bank)
        .unwrap();
    migrator
        .migrate_1_to_2(&chain.state.store, &mut chain.state.bank)
        .unwrap();
    assert!(chain.module_balance().is_empty());

    let err = migrator
        .migrate_1_to_2(&chain.state.store, &mut chain.state.bank)
        .unwrap_err();
    assert!(err.is_insufficient_funds());
}

// ---------------------------------------------------------------------------
// Rules and post-migration settlement
// ---------------------------------------------------------------------------

/// Keeps only the receive and acknowledgement fees in escrow.
struct AckOnly;

impl SettlementRule for AckOnly {
    fn escrow_total(&self, fee: &Fee) -> Coins {
        fee.recv_fee.add(&fee.ack_fee)
    }
}

#[test]
fn custom_rule_is_applied() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);

    let handler =
        UpgradeHandler::with_rule(chain.keeper.clone(), MigrationConfig::default(), AckOnly);
    let report = LegacyChain::report(handler.run_migrations(&mut chain.state).unwrap());

    assert_eq!(report.refunded, coins("stake", 300));
    assert_eq!(chain.module_balance(), coins("stake", 300));
}

#[test]
fn legacy_rule_refunds_nothing() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);

    let handler = UpgradeHandler::with_rule(
        chain.keeper.clone(),
        MigrationConfig::default(),
        LegacyCombined,
    );
    let report = LegacyChain::report(handler.run_migrations(&mut chain.state).unwrap());

    assert_eq!(report.refunds, 0);
    assert_eq!(chain.module_balance(), coins("stake", 600));
    assert_eq!(consensus_version(&chain.state.store).unwrap(), 2);
}

#[test]
fn migrated_escrow_settles_exactly() {
    let mut chain = LegacyChain::new();
    chain.escrow_legacy(&packet(1), &[Fee::dummy()]);
    chain.escrow_legacy(&packet(2), &[Fee::uniform_parts("stake", 100, 100, 150)]);
    chain.upgrade().unwrap();

    let (forward, reverse, timeout) =
        (AccAddress::random(), AccAddress::random(), AccAddress::random());
    let ChainState { store, bank } = &mut chain.state;
    chain
        .keeper
        .distribute_packet_fees_on_acknowledgement(store, bank, &packet(1), &forward, &reverse)
        .unwrap();
    chain
        .keeper
        .distribute_packet_fees_on_timeout(store, bank, &packet(2), &timeout)
        .unwrap();

    assert_eq!(bank.all_balances(&forward), coins("stake", 100));
    assert_eq!(bank.all_balances(&reverse), coins("stake", 200));
    assert_eq!(bank.all_balances(&timeout), coins("stake", 150));
    // Every escrowed coin has been paid out or refunded.
    assert!(bank.all_balances(chain.keeper.module_address()).is_empty());
    assert!(!store.has(&feeibc_keeper::store::fees_in_escrow_key(&packet(1))));
}

#[test]
fn new_escrows_after_upgrade_use_corrected_total() {
    let mut chain = LegacyChain::new();
    chain.upgrade().unwrap();

    let refund = chain.payer_bech32();
    let ChainState { store, bank } = &mut chain.state;
    chain
        .keeper
        .escrow_packet_fee(store, bank, &packet(9), PacketFee::new(Fee::dummy(), refund, vec![]))
        .unwrap();

    assert_eq!(bank.all_balances(chain.keeper.module_address()), coins("stake", 300));
    // A re-run finds version 2 and leaves the new escrow alone.
    assert_eq!(chain.upgrade().unwrap(), UpgradeOutcome::AlreadyCurrent);
    assert_eq!(chain.module_balance(), coins("stake", 300));
}

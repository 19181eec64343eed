//! Consensus-version gated upgrade.
//!
//! The store records which consensus version its contents follow. A store
//! without the key predates versioning and is treated as version 1.
//!
//! ```text
//! version 1 ──migrate_1_to_2 (+ escrow check if enabled) + set version 2──▶ version 2
//! version 2 ──no-op──▶ version 2
//! other     ──error
//! ```
//!
//! The migration runs on a branch of the chain state; the branch replaces
//! the live state only once every step has succeeded.

use feeibc_keeper::{BankKeeper, ChainState, FeeKeeper, KvStore, store};
use feeibc_types::{FeeError, MigrationConfig, Result, constants};

use crate::escrow_accounting::EscrowAccounting;
use crate::migrator::{MigrationReport, Migrator};
use crate::rule::{ExclusiveOutcome, SettlementRule};

/// Result of [`UpgradeHandler::run_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The store was at version 1 and has been migrated.
    Migrated(MigrationReport),
    /// The store was already at the current version.
    AlreadyCurrent,
}

/// Read the stored consensus version. Absent means version 1.
pub fn consensus_version(store: &impl KvStore) -> Result<u64> {
    store
        .get(&store::consensus_version_key())
        .map_or(Ok(constants::LEGACY_CONSENSUS_VERSION), |bytes| {
            serde_json::from_slice(&bytes).map_err(FeeError::from)
        })
}

pub fn set_consensus_version(store: &mut impl KvStore, version: u64) -> Result<()> {
    store.set(store::consensus_version_key(), serde_json::to_vec(&version)?);
    Ok(())
}

/// Runs the fee module's store migrations.
#[derive(Debug, Clone)]
pub struct UpgradeHandler<R = ExclusiveOutcome> {
    keeper: FeeKeeper,
    config: MigrationConfig,
    rule: R,
}

impl UpgradeHandler {
    #[must_use]
    pub fn new(keeper: FeeKeeper, config: MigrationConfig) -> Self {
        Self::with_rule(keeper, config, ExclusiveOutcome)
    }
}

impl<R: SettlementRule> UpgradeHandler<R> {
    #[must_use]
    pub fn with_rule(keeper: FeeKeeper, config: MigrationConfig, rule: R) -> Self {
        Self {
            keeper,
            config,
            rule,
        }
    }

    #[must_use]
    pub fn keeper(&self) -> &FeeKeeper {
        &self.keeper
    }

    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Bring the store up to the current consensus version.
    ///
    /// # Errors
    /// - `UnsupportedConsensusVersion` for a version with no migration path
    /// - any migration or escrow accounting error; `state` is untouched
    pub fn run_migrations<S, B>(&self, state: &mut ChainState<S, B>) -> Result<UpgradeOutcome>
    where
        S: KvStore + Clone,
        B: BankKeeper + Clone,
    {
        let version = consensus_version(&state.store)?;
        match version {
            constants::CONSENSUS_VERSION => {
                tracing::warn!(
                    version,
                    "Fee module already at current consensus version, skipping"
                );
                Ok(UpgradeOutcome::AlreadyCurrent)
            }
            constants::LEGACY_CONSENSUS_VERSION => {
                let report = state.run_atomic(|branch| self.migrate_branch(branch))?;
                tracing::info!(
                    from = version,
                    to = constants::CONSENSUS_VERSION,
                    packets = report.packets,
                    refunds = report.refunds,
                    "Fee module upgraded"
                );
                Ok(UpgradeOutcome::Migrated(report))
            }
            found => Err(FeeError::UnsupportedConsensusVersion {
                found,
                current: constants::CONSENSUS_VERSION,
            }),
        }
    }

    fn migrate_branch<S, B>(&self, branch: &mut ChainState<S, B>) -> Result<MigrationReport>
    where
        S: KvStore,
        B: BankKeeper,
    {
        let migrator = Migrator::with_rule(&self.keeper, &self.rule);
        let report = migrator.migrate_1_to_2(&branch.store, &mut branch.bank)?;

        if self.config.verify_escrow_after_migration {
            EscrowAccounting::from_store(&self.keeper, &branch.store, &self.rule)?
                .verify_module_balance(&self.keeper, &branch.bank)?;
        }

        set_consensus_version(&mut branch.store, constants::CONSENSUS_VERSION)?;
        Ok(report)
    }
}

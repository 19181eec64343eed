//! Configuration for the fee module and its upgrade migrations.

use serde::{Deserialize, Serialize};

use crate::{AccAddress, FeeError, Result, constants};

/// Chain-level settings the fee module depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeModuleConfig {
    /// Module name; its hash is the escrow account address.
    pub module_name: String,
    /// Human-readable prefix of account addresses on this chain.
    pub bech32_prefix: String,
}

impl Default for FeeModuleConfig {
    fn default() -> Self {
        Self {
            module_name: constants::MODULE_NAME.to_string(),
            bech32_prefix: constants::DEFAULT_BECH32_PREFIX.to_string(),
        }
    }
}

impl FeeModuleConfig {
    /// Escrow account address of the module.
    #[must_use]
    pub fn module_address(&self) -> AccAddress {
        AccAddress::module(&self.module_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.module_name.is_empty() {
            return Err(FeeError::Configuration("module_name is empty".into()));
        }
        let prefix_ok = !self.bech32_prefix.is_empty()
            && self
                .bech32_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !prefix_ok {
            return Err(FeeError::Configuration(format!(
                "bech32_prefix {:?} must be non-empty lowercase alphanumeric",
                self.bech32_prefix
            )));
        }
        Ok(())
    }
}

/// Settings for running the consensus-version migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// After migrating, also check that the module account still covers
    /// every escrow record under the corrected rule. Off by default: the
    /// migration trusts the stored records and the module balance.
    pub verify_escrow_after_migration: bool,
}

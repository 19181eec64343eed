//! Coin and coin-set types.
//!
//! [`Coins`] stores a mapping from denomination to amount rather than a
//! vector of [`Coin`]s. This guarantees there are no duplicate denoms and
//! that coins are always ordered by denom. Zero amounts are never stored.

use std::collections::{BTreeMap, btree_map};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FeeError, Result, constants};

/// Check a denomination against `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<()> {
    let mut chars = denom.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if !starts_alpha
        || !rest_ok
        || denom.len() < constants::MIN_DENOM_LEN
        || denom.len() > constants::MAX_DENOM_LEN
    {
        return Err(FeeError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

/// Check that an amount is a non-negative whole number within bounds.
fn validate_amount(denom: &str, amount: Decimal) -> Result<Decimal> {
    let invalid = |reason: &str| FeeError::InvalidAmount {
        denom: denom.to_string(),
        amount,
        reason: reason.to_string(),
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid("must not be negative"));
    }
    if !amount.fract().is_zero() {
        return Err(invalid("must be a whole number"));
    }
    if amount > constants::MAX_COIN_AMOUNT {
        return Err(invalid("exceeds the maximum coin amount"));
    }
    Ok(amount.normalize())
}

// ---------------------------------------------------------------------------
// Coin
// ---------------------------------------------------------------------------

/// A single amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Decimal,
}

impl Coin {
    /// Build a validated coin. Zero amounts are allowed (balance queries
    /// return them) but are never stored inside [`Coins`].
    pub fn new(denom: impl Into<String>, amount: Decimal) -> Result<Self> {
        let denom = denom.into();
        validate_denom(&denom)?;
        let amount = validate_amount(&denom, amount)?;
        Ok(Self { denom, amount })
    }

    /// A zero-amount coin of the given denom.
    #[must_use]
    pub fn zero(denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

// ---------------------------------------------------------------------------
// Coins
// ---------------------------------------------------------------------------

/// A sorted, denomination-unique set of strictly positive coins.
///
/// Serialized as an array of [`Coin`]s. Deserialization rejects zero
/// amounts and duplicate denoms.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(BTreeMap<String, Decimal>);

impl Coins {
    /// The empty coin set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a coin set, dropping zero amounts. Duplicate denoms are an error.
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for coin in coins {
            validate_denom(&coin.denom)?;
            let amount = validate_amount(&coin.denom, coin.amount)?;
            if map.contains_key(&coin.denom) {
                return Err(FeeError::DuplicateDenom(coin.denom));
            }
            if !amount.is_zero() {
                map.insert(coin.denom, amount);
            }
        }
        Ok(Self(map))
    }

    /// A coin set holding a single denomination.
    pub fn one(denom: impl Into<String>, amount: Decimal) -> Result<Self> {
        Self::from_coins([Coin::new(denom, amount)?])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Amount of the given denom; zero if absent.
    #[must_use]
    pub fn amount_of(&self, denom: &str) -> Decimal {
        self.0.get(denom).copied().unwrap_or(Decimal::ZERO)
    }

    /// Denominations present, in sorted order.
    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Decimal> {
        self.0.iter()
    }

    /// Denomination-wise sum.
    ///
    /// Every stored amount is at most [`constants::MAX_COIN_AMOUNT`], so
    /// summing a handful of coin sets cannot overflow. Unbounded
    /// accumulation should use [`Coins::checked_add`].
    #[must_use]
    pub fn add(&self, other: &Coins) -> Coins {
        let mut out = self.0.clone();
        for (denom, amount) in &other.0 {
            let entry = out.entry(denom.clone()).or_insert(Decimal::ZERO);
            *entry = entry.saturating_add(*amount);
        }
        Self(out)
    }

    /// Denomination-wise sum, failing on overflow.
    pub fn checked_add(&self, other: &Coins) -> Result<Coins> {
        let mut out = self.0.clone();
        for (denom, amount) in &other.0 {
            let entry = out.entry(denom.clone()).or_insert(Decimal::ZERO);
            *entry = entry
                .checked_add(*amount)
                .ok_or_else(|| FeeError::CoinOverflow {
                    denom: denom.clone(),
                })?;
        }
        Ok(Self(out))
    }

    /// Denomination-wise difference. Fails if any denom would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Result<Coins> {
        let mut out = self.0.clone();
        for (denom, amount) in &other.0 {
            let held = out.get(denom).copied().unwrap_or(Decimal::ZERO);
            if held < *amount {
                return Err(FeeError::CoinUnderflow {
                    denom: denom.clone(),
                });
            }
            let left = held - *amount;
            if left.is_zero() {
                out.remove(denom);
            } else {
                out.insert(denom.clone(), left);
            }
        }
        Ok(Self(out))
    }

    /// Denomination-wise difference keeping only strictly positive results.
    ///
    /// Denominations where `other` holds as much or more are dropped.
    #[must_use]
    pub fn saturating_sub(&self, other: &Coins) -> Coins {
        Self(
            self.0
                .iter()
                .filter_map(|(denom, amount)| {
                    let left = *amount - other.amount_of(denom);
                    (left > Decimal::ZERO).then(|| (denom.clone(), left))
                })
                .collect(),
        )
    }

    /// Denomination-wise maximum of the two sets.
    #[must_use]
    pub fn max(&self, other: &Coins) -> Coins {
        let mut out = self.0.clone();
        for (denom, amount) in &other.0 {
            let entry = out.entry(denom.clone()).or_insert(Decimal::ZERO);
            if *amount > *entry {
                *entry = *amount;
            }
        }
        Self(out)
    }

    /// Whether every denom of `other` is held in at least the same amount.
    #[must_use]
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other
            .0
            .iter()
            .all(|(denom, amount)| self.amount_of(denom) >= *amount)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = FeeError;

    fn try_from(coins: Vec<Coin>) -> Result<Self> {
        if let Some(coin) = coins.iter().find(|c| c.is_zero()) {
            return Err(FeeError::InvalidAmount {
                denom: coin.denom.clone(),
                amount: coin.amount,
                reason: "must be positive".into(),
            });
        }
        Self::from_coins(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins
            .0
            .into_iter()
            .map(|(denom, amount)| Coin { denom, amount })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = (&'a String, &'a Decimal);
    type IntoIter = btree_map::Iter<'a, String, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (denom, amount)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{amount}{denom}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({self})")
    }
}

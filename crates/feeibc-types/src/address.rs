//! Account addresses.
//!
//! Refund addresses are persisted as bech32 strings. They are resolved
//! into an [`AccAddress`] before any funds move; unvalidated strings never
//! cross that boundary.

use std::fmt;

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{FeeError, Result, constants};

/// Validated raw account address bytes.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccAddress(Vec<u8>);

impl AccAddress {
    /// Wrap raw bytes, checking the length bounds.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() || bytes.len() > constants::MAX_ADDRESS_LEN {
            return Err(FeeError::InvalidAddress {
                address: hex::encode(&bytes),
                reason: format!(
                    "address length must be between 1 and {}, got {}",
                    constants::MAX_ADDRESS_LEN,
                    bytes.len()
                ),
            });
        }
        Ok(Self(bytes))
    }

    /// Resolve a bech32 string whose human-readable part must equal `prefix`.
    pub fn from_bech32(address: &str, prefix: &str) -> Result<Self> {
        let invalid = |reason: String| FeeError::InvalidAddress {
            address: address.to_string(),
            reason,
        };

        if address.trim().is_empty() {
            return Err(invalid("empty address string".into()));
        }

        let (hrp, data, variant) =
            bech32::decode(address).map_err(|e| invalid(format!("bech32 decode: {e}")))?;
        if variant != Variant::Bech32 {
            return Err(invalid("expected bech32, got bech32m".into()));
        }
        if hrp != prefix {
            return Err(invalid(format!(
                "invalid prefix: expected {prefix}, got {hrp}"
            )));
        }

        let bytes =
            Vec::<u8>::from_base32(&data).map_err(|e| invalid(format!("bech32 data: {e}")))?;
        Self::from_bytes(bytes).map_err(|_| invalid("invalid address length".into()))
    }

    /// Address of a module account: the first 20 bytes of `sha256(name)`.
    #[must_use]
    pub fn module(name: &str) -> Self {
        let hash = Sha256::digest(name.as_bytes());
        Self(hash[..constants::ADDRESS_LEN].to_vec())
    }

    /// Encode as bech32 with the given human-readable prefix.
    pub fn to_bech32(&self, prefix: &str) -> Result<String> {
        bech32::encode(prefix, self.0.to_base32(), Variant::Bech32).map_err(|e| {
            FeeError::InvalidAddress {
                address: self.to_hex(),
                reason: format!("bech32 encode with prefix {prefix:?}: {e}"),
            }
        })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// Hex form. The bech32 form depends on the chain prefix, see
/// [`AccAddress::to_bech32`].
impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccAddress({})", self.to_hex())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl AccAddress {
    /// A random 20-byte account address.
    pub fn random() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; constants::ADDRESS_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bech32_roundtrip() {
        let addr = AccAddress::random();
        let s = addr.to_bech32("cosmos").unwrap();
        assert!(s.starts_with("cosmos1"));
        assert_eq!(AccAddress::from_bech32(&s, "cosmos").unwrap(), addr);
    }

    #[test]
    fn wrong_prefix_rejected() {
        let s = AccAddress::random().to_bech32("osmo").unwrap();
        let err = AccAddress::from_bech32(&s, "cosmos").unwrap_err();
        assert!(matches!(err, FeeError::InvalidAddress { .. }));
        assert!(err.to_string().contains("invalid prefix"));
    }

    #[test]
    fn garbage_rejected() {
        for bad in ["", "   ", "invalid", "cosmos1qqqqqq"] {
            let err = AccAddress::from_bech32(bad, "cosmos").unwrap_err();
            assert!(matches!(err, FeeError::InvalidAddress { .. }), "{bad:?}");
        }
    }

    #[test]
    fn module_address_is_sha256_prefix() {
        let addr = AccAddress::module("feeibc");
        assert_eq!(addr.as_bytes().len(), constants::ADDRESS_LEN);
        assert_eq!(addr.to_hex(), "f687822674b15af760d9fc6db730d77dc91361d9");
        assert_ne!(addr, AccAddress::module("transfer"));
    }

    #[test]
    fn display_does_not_assume_a_prefix() {
        let addr = AccAddress::module("feeibc");
        assert_eq!(addr.to_string(), "0xf687822674b15af760d9fc6db730d77dc91361d9");
        assert!(addr.to_bech32("osmo").unwrap().starts_with("osmo1"));
    }

    #[test]
    fn from_bytes_bounds() {
        assert!(AccAddress::from_bytes(Vec::new()).is_err());
        assert!(AccAddress::from_bytes(vec![1u8; 256]).is_err());
        assert!(AccAddress::from_bytes(vec![1u8; 32]).is_ok());
    }
}

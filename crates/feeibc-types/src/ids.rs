//! Packet identifiers used to key fee escrow buckets.
//!
//! Port and channel identifiers follow the ICS-24 host requirements: a
//! bounded length and a restricted character set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{FeeError, Result, constants};

/// Characters allowed in ICS-24 identifiers besides ASCII alphanumerics.
const VALID_ID_SPECIAL_CHARS: &str = "._+-#[]<>";

fn validate_identifier(id: &str, min: usize, max: usize) -> Result<()> {
    if id.contains('/') {
        return Err(FeeError::InvalidIdentifier {
            id: id.to_string(),
            reason: "must not contain '/'".into(),
        });
    }
    if id.len() < min || id.len() > max {
        return Err(FeeError::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("length must be between {min} and {max}, got {}", id.len()),
        });
    }
    if let Some(c) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !VALID_ID_SPECIAL_CHARS.contains(*c))
    {
        return Err(FeeError::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("invalid character {c:?}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// PortId
// ---------------------------------------------------------------------------

/// ICS-24 port identifier (e.g. `transfer`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortId(String);

impl PortId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(&id, constants::MIN_PORT_ID_LEN, constants::MAX_PORT_ID_LEN)?;
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PortId {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PortId {
    type Error = FeeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PortId> for String {
    fn from(id: PortId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// ChannelId
// ---------------------------------------------------------------------------

/// ICS-24 channel identifier (e.g. `channel-0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_identifier(
            &id,
            constants::MIN_CHANNEL_ID_LEN,
            constants::MAX_CHANNEL_ID_LEN,
        )?;
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelId {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = FeeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// Packet sequence number on a channel end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Sequence(pub u64);

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PacketId
// ---------------------------------------------------------------------------

/// Uniquely identifies one packet, and therefore one fee escrow bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PacketId {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub sequence: Sequence,
}

impl PacketId {
    /// Build a packet id from raw identifiers, validating both.
    pub fn new(
        port_id: impl Into<String>,
        channel_id: impl Into<String>,
        sequence: u64,
    ) -> Result<Self> {
        Ok(Self {
            port_id: PortId::new(port_id)?,
            channel_id: ChannelId::new(channel_id)?,
            sequence: Sequence(sequence),
        })
    }

    /// Re-check identifier rules. Always succeeds for values built through
    /// the validating constructors.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(
            self.port_id.as_str(),
            constants::MIN_PORT_ID_LEN,
            constants::MAX_PORT_ID_LEN,
        )?;
        validate_identifier(
            self.channel_id.as_str(),
            constants::MIN_CHANNEL_ID_LEN,
            constants::MAX_CHANNEL_ID_LEN,
        )
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.port_id, self.channel_id, self.sequence)
    }
}

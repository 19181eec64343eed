//! Key-value store backing the escrow records.
//!
//! Layout:
//!
//! ```text
//! feesInEscrow/{port_id}/{channel_id}/{sequence}  →  JSON(PacketFees)
//! consensusVersion                                →  JSON(u64)
//! ```

use std::collections::BTreeMap;

use feeibc_types::{ChannelId, FeeError, PacketId, PortId, Result, Sequence, constants};

/// Ordered byte-keyed store.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// Entries whose key starts with `prefix`, in ascending key order.
    fn prefix_iter<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// `BTreeMap`-backed store. Cloning it yields an independent branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn prefix_iter<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a> {
        let prefix = prefix.to_vec();
        Box::new(
            self.entries
                .range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.as_slice(), v.as_slice())),
        )
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Prefix shared by every escrow record key, including the trailing `/`.
#[must_use]
pub fn fees_in_escrow_prefix() -> Vec<u8> {
    format!("{}/", constants::FEES_IN_ESCROW_PREFIX).into_bytes()
}

/// Key of the escrow record for one packet.
#[must_use]
pub fn fees_in_escrow_key(packet_id: &PacketId) -> Vec<u8> {
    format!(
        "{}/{}/{}/{}",
        constants::FEES_IN_ESCROW_PREFIX,
        packet_id.port_id,
        packet_id.channel_id,
        packet_id.sequence
    )
    .into_bytes()
}

/// Recover the packet id from an escrow record key.
pub fn parse_fees_in_escrow_key(key: &[u8]) -> Result<PacketId> {
    let malformed = |reason: String| FeeError::MalformedKey {
        key: String::from_utf8_lossy(key).into_owned(),
        reason,
    };

    let key_str = std::str::from_utf8(key).map_err(|e| malformed(format!("not utf-8: {e}")))?;
    let parts: Vec<&str> = key_str.split('/').collect();
    if parts.len() != 4 {
        return Err(malformed(format!(
            "expected 4 '/'-separated parts, got {}",
            parts.len()
        )));
    }
    if parts[0] != constants::FEES_IN_ESCROW_PREFIX {
        return Err(malformed(format!("unexpected prefix {:?}", parts[0])));
    }

    let port_id = PortId::new(parts[1])?;
    let channel_id = ChannelId::new(parts[2])?;
    let sequence = parts[3]
        .parse::<u64>()
        .map_err(|e| malformed(format!("invalid sequence {:?}: {e}", parts[3])))?;

    Ok(PacketId {
        port_id,
        channel_id,
        sequence: Sequence(sequence),
    })
}

/// Key of the module consensus version.
#[must_use]
pub fn consensus_version_key() -> Vec<u8> {
    constants::CONSENSUS_VERSION_KEY.as_bytes().to_vec()
}

//! Deterministic record identifiers derived from event coordinates.
//!
//! Two layouts, each fixed-width so distinct coordinates can never collide:
//! - event ids: `tx_hash (32) || log_index (u32 BE)`, one per raw log
//! - owner ids: `owner (20) || block_number (u64 BE) || log_index (u32 BE)`, one per entity per log
//!
//! Re-deriving an id from the same event always yields the same bytes, which is what makes
//! re-delivery of an event land on the already-stored record.

use super::primitives::{decode_fixed_hex, Address, HexParseError, TxHash};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const EVENT_ID_LEN: usize = TxHash::LEN + 4;
const OWNER_ID_LEN: usize = Address::LEN + 8 + 4;

/// Identifier of a stored historical record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Vec<u8>);

impl RecordId {
    /// Id for a record that exists once per raw event (audit entry, pool transaction,
    /// processed-event marker).
    pub fn for_event(tx_hash: &TxHash, log_index: u32) -> Self {
        let mut bytes = Vec::with_capacity(EVENT_ID_LEN);
        bytes.extend_from_slice(tx_hash.as_bytes());
        bytes.extend_from_slice(&log_index.to_be_bytes());
        RecordId(bytes)
    }

    /// Id for a record that exists once per (owning entity, raw event), e.g. snapshots.
    pub fn for_owner(owner: &Address, block_number: u64, log_index: u32) -> Self {
        let mut bytes = Vec::with_capacity(OWNER_ID_LEN);
        bytes.extend_from_slice(owner.as_bytes());
        bytes.extend_from_slice(&block_number.to_be_bytes());
        bytes.extend_from_slice(&log_index.to_be_bytes());
        RecordId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a `0x`-prefixed hex id of either layout.
    ///
    /// # Errors
    /// Returns an error for invalid hex or a length matching neither layout.
    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        if let Ok(bytes) = decode_fixed_hex::<EVENT_ID_LEN>(s) {
            return Ok(RecordId(bytes.to_vec()));
        }
        match decode_fixed_hex::<OWNER_ID_LEN>(s) {
            Ok(bytes) => Ok(RecordId(bytes.to_vec())),
            Err(HexParseError::InvalidLength { actual, .. }) => Err(HexParseError::InvalidLength {
                expected: EVENT_ID_LEN,
                actual,
            }),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for RecordId {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

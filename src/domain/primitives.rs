//! Domain primitives: Address, TxHash, Timestamp, AssetIndex.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a fixed-width hex value (address, tx hash, record id).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Decode an optionally `0x`-prefixed hex string into exactly `N` bytes.
pub(crate) fn decode_fixed_hex<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let trimmed = s.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(hex_part).map_err(|e| HexParseError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HexParseError::InvalidLength {
            expected: N,
            actual,
        })
}

macro_rules! fixed_hex_type {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Width in bytes.
            pub const LEN: usize = $len;

            pub fn new(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = HexParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed_hex::<$len>(s).map($name)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_hex_type!(
    /// 20-byte account or contract address.
    Address,
    20
);

fixed_hex_type!(
    /// 32-byte transaction hash.
    TxHash,
    32
);

impl Address {
    /// The null address; a transfer from it is a mint, a transfer to it is a burn.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Block timestamp in seconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn new(secs: i64) -> Self {
        Timestamp(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of one of the pool's two assets. Index 0 is asset A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum AssetIndex {
    A,
    B,
}

impl AssetIndex {
    pub fn index(&self) -> usize {
        match self {
            AssetIndex::A => 0,
            AssetIndex::B => 1,
        }
    }

    pub fn other(&self) -> AssetIndex {
        match self {
            AssetIndex::A => AssetIndex::B,
            AssetIndex::B => AssetIndex::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("asset index must be 0 or 1, got {0}")]
pub struct AssetIndexError(pub u64);

impl TryFrom<u64> for AssetIndex {
    type Error = AssetIndexError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AssetIndex::A),
            1 => Ok(AssetIndex::B),
            other => Err(AssetIndexError(other)),
        }
    }
}

impl From<AssetIndex> for u64 {
    fn from(value: AssetIndex) -> Self {
        value.index() as u64
    }
}

impl fmt::Display for AssetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

//! `InfoHash`: the 20-byte SHA-1 of a bencoded `info` dictionary.
//!
//! Unlike [`crate::digest::Digest`] (which fingerprints raw blob bytes),
//! an `InfoHash` fingerprints a torrent descriptor's `info` record, the
//! same way BitTorrent does. It is computed once, by [`crate::metainfo`],
//! over the canonical bencoding of `{length, name, piece_length, pieces}`.
use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const BYTE_LEN: usize = 20;

/// A 20-byte `SHA-1` info-hash, displayed as 40 lowercase hex chars.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct InfoHash(pub [u8; BYTE_LEN]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("info-hash string {raw:?} has length {len}, expected {expected}, {location}")]
    InvalidStringLength {
        raw: String,
        len: usize,
        expected: usize,
        location: &'static Location<'static>,
    },

    #[error("info-hash bytes have length {len}, expected {BYTE_LEN}, {location}")]
    InvalidByteLength { len: usize, location: &'static Location<'static> },

    #[error("info-hash string {raw:?} contains non-hexadecimal characters, {location}")]
    InvalidHex { raw: String, location: &'static Location<'static> },
}

impl InfoHash {
    /// Computes the info-hash of an already-bencoded `info` dictionary.
    #[must_use]
    pub fn of_bencoded_info(bencoded_info: &[u8]) -> Self {
        let digest = sha1_smol::Sha1::from(bencoded_info).digest();
        Self(digest.bytes())
    }

    #[must_use]
    pub fn bytes(&self) -> [u8; BYTE_LEN] {
        self.0
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = [0u8; BYTE_LEN * 2];
        binascii::bin2hex(&self.0, &mut buffer).expect("20-byte buffer always hex-encodes into 40 bytes");
        write!(f, "{}", std::str::from_utf8(&buffer).expect("bin2hex only emits ASCII"))
    }
}

impl fmt::Debug for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfoHash({self})")
    }
}

impl FromStr for InfoHash {
    type Err = Error;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != BYTE_LEN * 2 {
            return Err(Error::InvalidStringLength {
                raw: s.to_owned(),
                len: s.len(),
                expected: BYTE_LEN * 2,
                location: Location::caller(),
            });
        }

        let mut bytes = [0u8; BYTE_LEN];
        binascii::hex2bin(s.as_bytes(), &mut bytes).map_err(|_| Error::InvalidHex {
            raw: s.to_owned(),
            location: Location::caller(),
        })?;

        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for InfoHash {
    type Error = Error;

    #[track_caller]
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != BYTE_LEN {
            return Err(Error::InvalidByteLength {
                len: bytes.len(),
                location: Location::caller(),
            });
        }

        let mut buf = [0u8; BYTE_LEN];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }
}

impl From<[u8; BYTE_LEN]> for InfoHash {
    fn from(bytes: [u8; BYTE_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for InfoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct InfoHashVisitor;

impl Visitor<'_> for InfoHashVisitor {
    type Value = InfoHash;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a 40-character hex string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for InfoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(InfoHashVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HEX: &str = "85b978c4377625b3963df406d0dd3a1da5a7d9c3";

    #[test]
    fn it_parses_and_displays_hex() {
        let info_hash: InfoHash = SAMPLE_HEX.parse().unwrap();
        assert_eq!(info_hash.to_string(), SAMPLE_HEX);
    }

    #[test]
    fn it_rejects_wrong_length_strings() {
        assert!(matches!(
            "abc".parse::<InfoHash>(),
            Err(Error::InvalidStringLength { .. })
        ));
    }

    #[test]
    fn it_rejects_non_hex_strings() {
        let bad = "z".repeat(40);
        assert!(matches!(bad.parse::<InfoHash>(), Err(Error::InvalidHex { .. })));
    }

    #[test]
    fn it_round_trips_through_bytes() {
        let bytes = [7u8; BYTE_LEN];
        let info_hash = InfoHash::from(bytes);
        assert_eq!(info_hash.bytes(), bytes);
        assert_eq!(InfoHash::try_from(&bytes[..]).unwrap(), info_hash);
    }

    #[test]
    fn it_rejects_wrong_length_byte_slices() {
        assert!(matches!(
            InfoHash::try_from(&[0u8; 19][..]),
            Err(Error::InvalidByteLength { .. })
        ));
    }

    #[test]
    fn it_computes_sha1_of_bencoded_info() {
        let info_hash = InfoHash::of_bencoded_info(b"d4:name5:helloe");
        assert_eq!(info_hash.bytes().len(), BYTE_LEN);
    }

    #[test]
    fn it_orders_by_byte_value() {
        let a = InfoHash::from([0u8; BYTE_LEN]);
        let mut high = [0u8; BYTE_LEN];
        high[0] = 1;
        let b = InfoHash::from(high);
        assert!(a < b);
    }

    #[test]
    fn it_serializes_and_deserializes_through_json() {
        let info_hash: InfoHash = SAMPLE_HEX.parse().unwrap();
        let json = serde_json::to_string(&info_hash).unwrap();
        assert_eq!(json, format!("{SAMPLE_HEX:?}"));
        assert_eq!(serde_json::from_str::<InfoHash>(&json).unwrap(), info_hash);
    }
}

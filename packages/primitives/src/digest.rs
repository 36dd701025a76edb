//! Content-addressed blob fingerprints.
//!
//! A [`Digest`] identifies a blob by the SHA-256 of its bytes. Its canonical
//! form is `"<algo>:<hex>"`, e.g.
//! `"sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"`.
//!
//! `Digest` is immutable once constructed and every constructor is total: it
//! either returns a `Digest` or an [`Error`], never panics on malformed
//! input.
use std::fmt;
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ALGO: &str = "sha256";
const HEX_LEN: usize = 64;

/// A content-addressed blob fingerprint, `"<algo>:<hex>"`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Digest {
    hex: String,
}

/// Errors returned when parsing or validating a [`Digest`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("digest input is empty, {location}")]
    Empty { location: &'static Location<'static> },

    #[error("digest {raw:?} is missing the ':' separator, {location}")]
    MissingSeparator {
        raw: String,
        location: &'static Location<'static>,
    },

    #[error("digest {raw:?} uses algo {algo:?}, only {ALGO:?} is supported, {location}")]
    UnsupportedAlgo {
        raw: String,
        algo: String,
        location: &'static Location<'static>,
    },

    #[error("digest hex {hex:?} has length {len}, expected {HEX_LEN}, {location}")]
    WrongHexLength {
        hex: String,
        len: usize,
        location: &'static Location<'static>,
    },

    #[error("digest hex {hex:?} contains non-hexadecimal characters, {location}")]
    NotHex { hex: String, location: &'static Location<'static> },
}

impl Digest {
    /// Parses the canonical `"<algo>:<hex>"` form.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the input is empty, missing the separator,
    /// uses an unsupported algo, or the hex part is malformed.
    #[track_caller]
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if raw.is_empty() {
            return Err(Error::Empty {
                location: Location::caller(),
            });
        }

        let Some((algo, hex)) = raw.split_once(':') else {
            return Err(Error::MissingSeparator {
                raw: raw.to_owned(),
                location: Location::caller(),
            });
        };

        if algo != ALGO {
            return Err(Error::UnsupportedAlgo {
                raw: raw.to_owned(),
                algo: algo.to_owned(),
                location: Location::caller(),
            });
        }

        Self::from_hex(hex)
    }

    /// Builds a `Digest` from a bare sha256 hex string (no `algo:` prefix).
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if `hex` is not exactly 64 lowercase hex chars.
    #[track_caller]
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        validate_sha256(hex)?;
        Ok(Self { hex: hex.to_owned() })
    }

    /// Computes the digest of `bytes`.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        use sha2::{Digest as _, Sha256};

        let hex = hex_lower(&Sha256::digest(bytes));
        Self { hex }
    }

    #[must_use]
    pub fn algo(&self) -> &str {
        ALGO
    }

    #[must_use]
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// First 4 hex characters, used to shard storage directories.
    ///
    /// # Panics
    ///
    /// Never panics: `hex` is always validated to be exactly 64 chars at
    /// construction.
    #[must_use]
    pub fn shard_id(&self) -> &str {
        &self.hex[..4]
    }

    #[must_use]
    pub fn string(&self) -> String {
        self.to_string()
    }
}

/// Validates that `hex` is exactly 64 lowercase hexadecimal characters.
///
/// # Errors
///
/// Returns [`Error::WrongHexLength`] or [`Error::NotHex`].
#[track_caller]
pub fn validate_sha256(hex: &str) -> Result<(), Error> {
    if hex.len() != HEX_LEN {
        return Err(Error::WrongHexLength {
            hex: hex.to_owned(),
            len: hex.len(),
            location: Location::caller(),
        });
    }

    if !hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
        return Err(Error::NotHex {
            hex: hex.to_owned(),
            location: Location::caller(),
        });
    }

    Ok(())
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ALGO}:{}", self.hex)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn it_parses_the_canonical_form() {
        let digest = Digest::parse(SAMPLE).unwrap();
        assert_eq!(digest.algo(), "sha256");
        assert_eq!(digest.hex(), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(digest.shard_id(), "e3b0");
    }

    #[test]
    fn it_round_trips_through_string() {
        let digest = Digest::parse(SAMPLE).unwrap();
        assert_eq!(Digest::parse(&digest.string()).unwrap(), digest);
        assert_eq!(Digest::from_hex(digest.hex()).unwrap().string(), digest.string());
    }

    #[test]
    fn it_rejects_unsupported_algos() {
        let raw = SAMPLE.replacen("sha256", "sha1", 1);
        assert!(matches!(Digest::parse(&raw), Err(Error::UnsupportedAlgo { .. })));
    }

    #[test]
    fn it_rejects_wrong_length_hex() {
        assert!(matches!(
            Digest::from_hex(&"a".repeat(63)),
            Err(Error::WrongHexLength { .. })
        ));
        assert!(matches!(
            Digest::from_hex(&"a".repeat(65)),
            Err(Error::WrongHexLength { .. })
        ));
    }

    #[test]
    fn it_rejects_non_hex_characters() {
        let hex = "g".repeat(64);
        assert!(matches!(Digest::from_hex(&hex), Err(Error::NotHex { .. })));
    }

    #[test]
    fn it_rejects_empty_input() {
        assert!(matches!(Digest::parse(""), Err(Error::Empty { .. })));
    }

    #[test]
    fn it_rejects_missing_separator() {
        assert!(matches!(Digest::parse("abc"), Err(Error::MissingSeparator { .. })));
    }

    #[test]
    fn it_computes_the_digest_of_empty_bytes() {
        assert_eq!(Digest::of_bytes(&[]).string(), SAMPLE);
    }

    #[test]
    fn it_serializes_as_the_canonical_string() {
        let digest = Digest::parse(SAMPLE).unwrap();
        assert_eq!(serde_json::to_string(&digest).unwrap(), format!("{SAMPLE:?}"));
    }
}

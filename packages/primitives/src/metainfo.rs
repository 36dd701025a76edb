//! `MetaInfo`: the torrent descriptor for a blob.
//!
//! A `MetaInfo` splits a blob into fixed-size pieces, keeping a CRC32
//! checksum per piece (not a full hash tree: piece integrity only needs to
//! catch corruption, not resist tampering) and the whole blob's name and
//! length. Its [`InfoHash`](crate::info_hash::InfoHash) is the SHA-1 of the
//! canonical bencoding of the `Info` record itself (capitalized keys,
//! `PieceSums` as a bencode integer list), not a BitTorrent-shaped `info`
//! dict. This wire format is a backward-compatibility anchor: it must never
//! change (see the `it_matches_the_wire_compat_info_hash_anchor` test).
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::info_hash::InfoHash;

/// Default piece size: 4 MiB, matching Kraken's production torrent client.
pub const DEFAULT_PIECE_LENGTH: i64 = 4 * 1024 * 1024;

/// The canonical `info` record of a torrent descriptor.
///
/// Field names are capitalized to match Kraken's on-the-wire JSON
/// (`{"Info": {"PieceLength": ..., "PieceSums": ..., "Name": ..., "Length": ...}}`),
/// not idiomatic Rust casing. Fields are *declared* in sorted-key order
/// (`Length`, `Name`, `PieceLength`, `PieceSums`) because `serde_bencode`
/// encodes struct fields in declaration order and bencode dictionary keys
/// must sort lexicographically; this struct is bencoded directly to derive
/// the info-hash, so getting that order wrong silently changes every hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(rename = "Length")]
    pub length: i64,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "PieceLength")]
    pub piece_length: i64,

    #[serde(rename = "PieceSums")]
    pub piece_sums: Vec<u32>,
}

/// A torrent descriptor: one [`Info`] record plus its derived info-hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    #[serde(rename = "Info")]
    pub info: Info,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read blob while computing piece sums: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bencode the info record: {0}")]
    Bencode(#[from] serde_bencode::Error),
}

impl MetaInfo {
    /// Builds a `MetaInfo` by chunking `reader` into `piece_length`-sized
    /// pieces and CRC32-checksumming each one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading the blob fails.
    pub fn from_reader<R: Read>(mut reader: R, name: String, piece_length: i64, length: i64) -> Result<Self, Error> {
        let mut piece_sums = Vec::new();
        let mut buf = vec![0u8; usize::try_from(piece_length).unwrap_or(DEFAULT_PIECE_LENGTH as usize)];

        loop {
            let read = read_fully(&mut reader, &mut buf)?;
            if read == 0 {
                break;
            }
            piece_sums.push(crc32fast::hash(&buf[..read]));
            if read < buf.len() {
                break;
            }
        }

        Ok(Self {
            info: Info {
                piece_length,
                piece_sums,
                name,
                length,
            },
        })
    }

    #[must_use]
    pub fn piece_length(&self) -> i64 {
        self.info.piece_length
    }

    #[must_use]
    pub fn num_pieces(&self) -> usize {
        self.info.piece_sums.len()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[must_use]
    pub fn length(&self) -> i64 {
        self.info.length
    }

    /// Derives this descriptor's info-hash from the canonical bencoding of
    /// its `info` record: `Length`, `Name`, `PieceLength`, `PieceSums` in
    /// that (sorted-key) order, `PieceSums` as a bencode integer list. This
    /// is a wire-compat anchor and must never change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bencode`] if the record cannot be bencoded, which
    /// only happens if `name` contains data `serde_bencode` cannot encode.
    pub fn info_hash(&self) -> Result<InfoHash, Error> {
        let bytes = serde_bencode::to_bytes(&self.info)?;
        Ok(InfoHash::of_bencoded_info(&bytes))
    }
}

fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

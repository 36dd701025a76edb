//! Primitive data types shared by Kraken's coordination-tier crates.
//!
//! This crate has no knowledge of storage backends, HTTP transports or
//! schedulers. It only knows how to identify things: blobs ([`digest`]),
//! torrent descriptors ([`info_hash`], [`metainfo`]) and peers ([`peer`]).
use std::time::Duration;

pub mod digest;
pub mod info_hash;
pub mod metainfo;
pub mod peer;

/// A duration measured from the Unix epoch, shared with `kraken-clock`.
pub type DurationSinceUnixEpoch = Duration;

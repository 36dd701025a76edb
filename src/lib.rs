//! **Kraken** is a peer-to-peer content-addressed blob distribution
//! system's coordination tier: it tracks which peers hold which blobs and
//! hands out ranked peer lists, the way a `BitTorrent` tracker hands out
//! swarms, and distributes the metainfo descriptors peers need to verify
//! what they download.
//!
//! This crate is the root binary/library package; the data model
//! (`Digest`, `InfoHash`, `PeerId`/`PeerContext`/`PeerInfo`, `MetaInfo`)
//! and the peer store live in `kraken-primitives` and `kraken-peer-store`.
pub mod app;
pub mod bootstrap;
pub mod cache;
pub mod error;
pub mod filestore;
pub mod handout;
pub mod http;
pub mod metainfo_client;
pub mod metrics;
pub mod servers;

#[macro_use]
extern crate lazy_static;

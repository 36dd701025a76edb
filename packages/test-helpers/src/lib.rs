//! Test fixtures shared across Kraken's coordination-tier crates: ephemeral
//! configuration and sample digests/info-hashes/peers.
pub mod configuration;
pub mod fixtures;
pub mod random;

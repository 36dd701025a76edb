//! Sample digests, info-hashes, peers and metainfo descriptors for tests.
use kraken_primitives::digest::Digest;
use kraken_primitives::info_hash::InfoHash;
use kraken_primitives::metainfo::MetaInfo;
use kraken_primitives::peer;
use rand::rngs::SmallRng;
use rand::SeedableRng as _;

/// A digest derived deterministically from `seed`, useful when a test needs
/// several distinct-but-reproducible digests.
#[must_use]
pub fn digest(seed: u8) -> Digest {
    Digest::of_bytes(&[seed; 32])
}

#[must_use]
pub fn info_hash(seed: u8) -> InfoHash {
    InfoHash::from([seed; kraken_primitives::info_hash::BYTE_LEN])
}

#[must_use]
pub fn peer_id(seed: u64) -> peer::PeerId {
    let mut rng = SmallRng::seed_from_u64(seed);
    peer::PeerId::random(&mut rng)
}

#[must_use]
pub fn peer_info(seed: u64, complete: bool) -> peer::PeerInfo {
    use std::net::{IpAddr, Ipv4Addr};

    peer::PeerInfo {
        peer_id: peer_id(seed),
        ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
        port: 6881 + u16::try_from(seed % 1000).unwrap_or(0),
        origin: peer::Origin::Peer,
        complete,
    }
}

#[must_use]
pub fn metainfo(name: &str, length: i64, piece_length: i64) -> MetaInfo {
    let blob = vec![0u8; usize::try_from(length).unwrap_or(0)];
    MetaInfo::from_reader(&blob[..], name.to_owned(), piece_length, length).expect("in-memory reads never fail")
}

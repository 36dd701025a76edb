//! Peer identity: `PeerId`, `PeerContext` (how a peer describes itself) and
//! `PeerInfo` (how the peer store and handout policy see a peer).
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::panic::Location;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BYTE_LEN: usize = 20;

/// A 20-byte peer identifier, displayed as 40 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerId(pub [u8; BYTE_LEN]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("peer id string {raw:?} has length {len}, expected {expected}, {location}")]
    InvalidStringLength {
        raw: String,
        len: usize,
        expected: usize,
        location: &'static Location<'static>,
    },

    #[error("peer id string {raw:?} contains non-hexadecimal characters, {location}")]
    InvalidHex { raw: String, location: &'static Location<'static> },
}

impl PeerId {
    /// Generates a new random peer id using the supplied RNG.
    ///
    /// The RNG is caller-supplied so sampling stays reproducible under
    /// tests (seeded PRNGs), matching how the rest of the coordination
    /// tier avoids hidden global randomness.
    pub fn random(rng: &mut impl RngCore) -> Self {
        let mut bytes = [0u8; BYTE_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derives a deterministic peer id from a socket address, used when a
    /// client did not supply one of its own: the SHA-1 of `"<ip>:<port>"`.
    #[must_use]
    pub fn of_addr(addr: &SocketAddr) -> Self {
        Self(sha1_smol::Sha1::from(addr.to_string().as_bytes()).digest().bytes())
    }

    #[must_use]
    pub fn bytes(&self) -> [u8; BYTE_LEN] {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = [0u8; BYTE_LEN * 2];
        binascii::bin2hex(&self.0, &mut buffer).expect("20-byte buffer always hex-encodes into 40 bytes");
        write!(f, "{}", std::str::from_utf8(&buffer).expect("bin2hex only emits ASCII"))
    }
}

impl std::str::FromStr for PeerId {
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

impl TryFrom<String> for PeerId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeerId> for String {
    fn from(value: PeerId) -> Self {
        value.to_string()
    }
}

/// How a peer describes itself when announcing: where it listens, and the
/// zone/cluster/origin labels the handout policy groups peers by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerContext {
    pub peer_id: PeerId,
    pub ip: IpAddr,
    pub port: u16,
    pub zone: String,
    pub cluster: String,
    pub origin: Origin,
}

impl PeerContext {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

/// Whether a peer reached a blob by seeding it originally or by downloading
/// it from another peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Origin,
    Peer,
}

/// A peer as recorded by the peer store and handed out by the handout
/// policy: identity, address, origin, and whether it already has the full
/// blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub peer_id: PeerId,
    pub ip: IpAddr,
    pub port: u16,
    pub origin: Origin,
    pub complete: bool,
}

impl PeerInfo {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    #[must_use]
    pub fn from_context(context: &PeerContext, complete: bool) -> Self {
        Self {
            peer_id: context.peer_id,
            ip: context.ip,
            port: context.port,
            origin: context.origin,
            complete,
        }
    }
}

#[cfg(test)]
pub mod fixture {
    use std::net::{IpAddr, Ipv4Addr};

    use rand::rngs::SmallRng;
    use rand::SeedableRng as _;

    use super::{Origin, PeerContext, PeerId, PeerInfo};

    #[must_use]
    pub fn sample_peer_id(seed: u64) -> PeerId {
        let mut rng = SmallRng::seed_from_u64(seed);
        PeerId::random(&mut rng)
    }

    #[must_use]
    pub fn sample_peer_context(seed: u64) -> PeerContext {
        PeerContext {
            peer_id: sample_peer_id(seed),
            ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 6881,
            zone: "zone-a".to_owned(),
            cluster: "cluster-a".to_owned(),
            origin: Origin::Peer,
        }
    }

    #[must_use]
    pub fn sample_peer_info(seed: u64, complete: bool) -> PeerInfo {
        PeerInfo::from_context(&sample_peer_context(seed), complete)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::SeedableRng as _;

    use super::*;

    #[test]
    fn it_generates_random_ids_with_a_seeded_rng() {
        let mut rng = SmallRng::seed_from_u64(42);
        let a = PeerId::random(&mut rng);
        let b = PeerId::random(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn it_derives_the_same_id_for_the_same_address() {
        let addr: SocketAddr = "127.0.0.1:6881".parse().unwrap();
        assert_eq!(PeerId::of_addr(&addr), PeerId::of_addr(&addr));
    }

    #[test]
    fn it_round_trips_through_hex_string() {
        let mut rng = SmallRng::seed_from_u64(7);
        let id = PeerId::random(&mut rng);
        let hex = id.to_string();
        assert_eq!(hex.parse::<PeerId>().unwrap(), id);
    }

    #[test]
    fn it_rejects_malformed_hex_strings() {
        assert!(matches!(
            "not-hex".parse::<PeerId>(),
            Err(Error::InvalidStringLength { .. })
        ));
    }

    #[test]
    fn peer_info_inherits_address_and_identity_from_context() {
        let context = fixture::sample_peer_context(1);
        let info = PeerInfo::from_context(&context, true);
        assert_eq!(info.peer_id, context.peer_id);
        assert_eq!(info.addr(), context.addr());
        assert!(info.complete);
    }
}

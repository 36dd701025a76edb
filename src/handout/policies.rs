use std::net::{IpAddr, Ipv4Addr};
use std::panic::Location;

use kraken_primitives::peer::{Origin, PeerContext};

use super::{AssignPriority, Candidate};
use crate::error::Error;

/// Every peer gets priority 0. The trivial policy; useful as a default and
/// in tests.
pub struct DefaultPolicy;

impl AssignPriority for DefaultPolicy {
    fn assign_priority(&self, _source: &PeerContext, peers: &mut [Candidate]) -> Result<(), Error> {
        for peer in peers {
            peer.priority = 0;
            peer.label = "default";
        }
        Ok(())
    }
}

/// Prefers warm seeders over origins, pushes leechers to the back.
pub struct CompletenessPolicy;

impl AssignPriority for CompletenessPolicy {
    fn assign_priority(&self, _source: &PeerContext, peers: &mut [Candidate]) -> Result<(), Error> {
        for peer in peers.iter_mut() {
            let (priority, label) = match (peer.origin, peer.complete) {
                (Origin::Origin, _) => (1, "origin"),
                (Origin::Peer, true) => (0, "peer_seeder"),
                (Origin::Peer, false) => (2, "peer_incomplete"),
            };
            peer.priority = priority;
            peer.label = label;
        }
        // Stable-sort on completeness within a priority tier, as the policy
        // contract requires: `sort_by_key` below (in `sort_peers`) is
        // already stable, so ties keep their relative order once priority
        // matches; this second pass further breaks ties by completeness.
        peers.sort_by_key(|p| !p.complete);
        Ok(())
    }
}

/// Priority by network proximity of the source's IPv4 address: same /24
/// rack, same /17 pod, same zone string, otherwise unrelated.
pub struct Ipv4NetmaskPolicy;

impl AssignPriority for Ipv4NetmaskPolicy {
    fn assign_priority(&self, source: &PeerContext, peers: &mut [Candidate]) -> Result<(), Error> {
        let source_v4 = as_v4(source.ip);
        for peer in peers.iter_mut() {
            let (priority, label) = match (source_v4, as_v4(peer.ip)) {
                (Some(a), Some(b)) if mask(a, 24) == mask(b, 24) => (0, "rack"),
                (Some(a), Some(b)) if mask(a, 17) == mask(b, 17) => (1, "pod"),
                _ if peer.zone.as_deref() == Some(source.zone.as_str()) => (2, "datacenter"),
                _ => (3, "other"),
            };
            peer.priority = priority;
            peer.label = label;
        }
        Ok(())
    }
}

fn as_v4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    }
}

fn mask(ip: Ipv4Addr, prefix_len: u32) -> u32 {
    let bits = u32::from(ip);
    let mask = if prefix_len == 0 { 0 } else { u32::MAX << (32 - prefix_len) };
    bits & mask
}

/// Priority by a peer-id encoded as `"<id>:<rack>:<pod>:<dc>"`; source
/// components are compared positionally against each candidate's.
pub struct MockNetworkPolicy;

struct Topology<'a> {
    rack: &'a str,
    pod: &'a str,
    dc: &'a str,
}

fn parse_topology(peer_id: &str) -> Option<Topology<'_>> {
    let mut parts = peer_id.splitn(4, ':');
    let _id = parts.next()?;
    let rack = parts.next()?;
    let pod = parts.next()?;
    let dc = parts.next()?;
    Some(Topology { rack, pod, dc })
}

#[track_caller]
fn invalid_peer_id_error(peer_id: &str) -> Error {
    Error::Validation {
        source: kraken_located_error::Located(Box::new(std::io::Error::other(format!(
            "mock-network policy cannot parse peer id {peer_id:?} as \"<id>:<rack>:<pod>:<dc>\""
        ))) as Box<dyn std::error::Error + Send + Sync>)
        .into(),
        location: Location::caller(),
    }
}

impl AssignPriority for MockNetworkPolicy {
    fn assign_priority(&self, source: &PeerContext, peers: &mut [Candidate]) -> Result<(), Error> {
        let source_id = source.peer_id.to_string();
        let source_topology = parse_topology(&source_id).ok_or_else(|| invalid_peer_id_error(&source_id))?;

        for peer in peers.iter_mut() {
            let peer_id = peer.peer_id.to_string();
            let topology = parse_topology(&peer_id).ok_or_else(|| invalid_peer_id_error(&peer_id))?;
            let (priority, label) = if topology.rack == source_topology.rack {
                (0, "rack")
            } else if topology.pod == source_topology.pod {
                (1, "pod")
            } else if topology.dc == source_topology.dc {
                (2, "dc")
            } else {
                (3, "other")
            };
            peer.priority = priority;
            peer.label = label;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use kraken_test_helpers::fixtures;

    use super::*;

    fn ctx(ip: Ipv4Addr, zone: &str) -> PeerContext {
        PeerContext {
            peer_id: fixtures::peer_id(1),
            ip: IpAddr::V4(ip),
            port: 6881,
            zone: zone.to_owned(),
            cluster: "c".to_owned(),
            origin: Origin::Peer,
        }
    }

    fn candidate(ip: Ipv4Addr, zone: &str) -> Candidate {
        Candidate::new(fixtures::peer_id(2), IpAddr::V4(ip), 6881, Some(zone.to_owned()), true, Origin::Peer)
    }

    #[test]
    fn completeness_prefers_peer_seeders_over_origins_over_leechers() {
        let source = ctx(Ipv4Addr::new(10, 0, 0, 1), "zone-a");
        let mut peers = vec![
            Candidate::new(fixtures::peer_id(2), source.ip, 6881, None, false, Origin::Origin),
            Candidate::new(fixtures::peer_id(3), source.ip, 6881, None, true, Origin::Peer),
            Candidate::new(fixtures::peer_id(4), source.ip, 6881, None, false, Origin::Peer),
        ];
        CompletenessPolicy.assign_priority(&source, &mut peers).unwrap();
        assert_eq!(peers[0].label, "peer_seeder");
    }

    #[test]
    fn ipv4netmask_ranks_same_rack_above_same_pod_above_same_zone() {
        let source = ctx(Ipv4Addr::new(10, 0, 0, 1), "zone-a");
        let mut peers = vec![
            candidate(Ipv4Addr::new(10, 0, 0, 2), "zone-a"),
            candidate(Ipv4Addr::new(10, 0, 1, 2), "zone-a"),
            candidate(Ipv4Addr::new(10, 1, 0, 2), "zone-a"),
            candidate(Ipv4Addr::new(192, 168, 0, 2), "zone-b"),
        ];
        Ipv4NetmaskPolicy.assign_priority(&source, &mut peers).unwrap();
        assert_eq!(peers[0].label, "rack");
        assert_eq!(peers[1].label, "pod");
        assert_eq!(peers[2].label, "datacenter");
        assert_eq!(peers[3].label, "other");
    }

    #[test]
    fn mock_network_parses_rack_pod_dc_from_the_peer_id() {
        assert_eq!(parse_topology("abc:r1:p1:dc1").unwrap().rack, "r1");
        assert!(parse_topology("not-enough-parts").is_none());
    }

    #[test]
    fn mock_network_returns_validation_error_when_source_peer_id_is_not_rack_pod_dc_format() {
        let source = ctx(Ipv4Addr::new(10, 0, 0, 1), "zone-a");
        let mut peers = vec![candidate(Ipv4Addr::new(10, 0, 0, 2), "zone-a")];

        let err = MockNetworkPolicy.assign_priority(&source, &mut peers).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}

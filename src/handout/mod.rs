//! Peer-handout policies: decide the priority order peers are served to an
//! announcing peer in.
mod policies;

use std::net::IpAddr;

use kraken_primitives::peer::{Origin, PeerContext, PeerId};
use tracing::debug;

pub use policies::{CompletenessPolicy, DefaultPolicy, Ipv4NetmaskPolicy, MockNetworkPolicy};

use crate::error::Error;
use crate::metrics::Metrics;

/// A peer as seen by the handout policy: enough of `PeerContext`/`PeerInfo`
/// to assign and sort by priority, plus the mutable priority slot itself.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub peer_id: PeerId,
    pub ip: IpAddr,
    pub port: u16,
    pub zone: Option<String>,
    pub complete: bool,
    pub origin: Origin,
    pub priority: i64,
    pub label: &'static str,
}

impl Candidate {
    #[must_use]
    pub fn new(peer_id: PeerId, ip: IpAddr, port: u16, zone: Option<String>, complete: bool, origin: Origin) -> Self {
        Self {
            peer_id,
            ip,
            port,
            zone,
            complete,
            origin,
            priority: 0,
            label: "unranked",
        }
    }
}

/// A named, closed-enumeration assignment strategy. Lower priority is
/// better; the source peer itself never receives a priority (it is
/// filtered out of the candidate list before sorting).
pub trait AssignPriority: Send + Sync {
    /// Mutates each candidate's `priority` and `label` in place.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a policy cannot interpret a peer id it
    /// depends on (e.g. `MockNetworkPolicy`'s `"<id>:<rack>:<pod>:<dc>"`
    /// encoding).
    fn assign_priority(&self, source: &PeerContext, peers: &mut [Candidate]) -> Result<(), Error>;
}

/// Closed set of policy names selectable at construction, per
/// `[peer_store] handout_policy` (or an explicit override).
#[must_use]
pub fn policy_by_name(name: &str) -> Option<Box<dyn AssignPriority>> {
    match name {
        "default" => Some(Box::new(DefaultPolicy)),
        "completeness" => Some(Box::new(CompletenessPolicy)),
        "ipv4netmask" => Some(Box::new(Ipv4NetmaskPolicy)),
        "mock-network" => Some(Box::new(MockNetworkPolicy)),
        _ => None,
    }
}

/// Assigns priority, drops the source peer from the list, and stable-sorts
/// ascending by priority. Per-label counts are logged and forwarded to
/// `metrics`.
///
/// # Errors
///
/// Propagates `Error::Validation` from `policy.assign_priority`.
pub fn sort_peers(policy: &dyn AssignPriority, source: &PeerContext, mut peers: Vec<Candidate>, metrics: &dyn Metrics) -> Result<Vec<Candidate>, Error> {
    peers.retain(|p| p.peer_id != source.peer_id);
    policy.assign_priority(source, &mut peers)?;
    peers.sort_by_key(|p| p.priority);

    for label in distinct_labels(&peers) {
        let count = peers.iter().filter(|p| p.label == label).count();
        debug!(label, count, "handout priority counts");
        metrics.record_handout_label(label, count);
    }

    Ok(peers)
}

fn distinct_labels(peers: &[Candidate]) -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = peers.iter().map(|p| p.label).collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use kraken_test_helpers::fixtures;

    use super::*;
    use crate::metrics::NoopMetrics;

    fn context(seed: u64) -> PeerContext {
        let info = fixtures::peer_info(seed, false);
        PeerContext {
            peer_id: info.peer_id,
            ip: info.ip,
            port: info.port,
            zone: "zone-a".to_owned(),
            cluster: "cluster-a".to_owned(),
            origin: Origin::Peer,
        }
    }

    #[test]
    fn default_policy_ranks_everyone_equally_and_filters_the_source() {
        let source = context(1);
        let peers = vec![
            Candidate::new(source.peer_id, source.ip, source.port, None, false, Origin::Peer),
            Candidate::new(fixtures::peer_id(2), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 6882, None, true, Origin::Peer),
        ];

        let sorted = sort_peers(&DefaultPolicy, &source, peers, &NoopMetrics).unwrap();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].priority, 0);
        assert_eq!(sorted[0].label, "default");
    }

    #[test]
    fn policy_by_name_rejects_unknown_names() {
        assert!(policy_by_name("quantum-routing").is_none());
        assert!(policy_by_name("completeness").is_some());
    }

    #[test]
    fn sort_peers_propagates_a_policy_validation_error() {
        let source = context(1);
        let peers = vec![Candidate::new(fixtures::peer_id(2), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 6882, None, true, Origin::Peer)];

        let err = sort_peers(&MockNetworkPolicy, &source, peers, &NoopMetrics).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}

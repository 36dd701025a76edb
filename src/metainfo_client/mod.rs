//! The metainfo distribution client: polls the ring for a blob's
//! [`MetaInfo`] descriptor using an idempotent GET with exponential backoff.
pub mod ring;

use std::time::{Duration, Instant};

use kraken_configuration::sections::metainfo_client::MetainfoClient as MetainfoClientConfig;
use kraken_primitives::digest::Digest;
use kraken_primitives::metainfo::MetaInfo;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::http::retry::Backoff;
use crate::http::{self, retry::RetryPolicy};
use ring::Ring;

pub struct MetainfoClient {
    ring: Ring,
    config: MetainfoClientConfig,
    http: reqwest::Client,
}

impl MetainfoClient {
    #[must_use]
    pub fn new(config: MetainfoClientConfig) -> Self {
        let ring = Ring::new(config.ring_addrs.clone());
        Self {
            ring,
            config,
            http: reqwest::Client::new(),
        }
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(RetryPolicy {
            max_attempts: u32::MAX,
            initial_interval: Duration::from_millis(self.config.backoff_initial_ms),
            multiplier: self.config.backoff_multiplier_permille as f64 / 1000.0,
            max_interval: Duration::from_millis(self.config.backoff_max_ms),
            jitter_fraction: self.config.jitter_permille as f64 / 1000.0,
        })
    }

    /// Fetches `digest`'s metainfo from the ring. Iterates
    /// `Locations(digest)` in order; for each address, polls with
    /// exponential backoff until 200 (success), 404 (hard failure, stop
    /// entirely), a network error (failover to next address), or the poll
    /// budget is exhausted.
    pub async fn fetch(&self, namespace: &str, digest: &Digest) -> Result<MetaInfo, Error> {
        let addresses = self.ring.locations(digest, self.config.replication_factor);
        let mut last_err = None;

        for addr in addresses {
            match self.poll_one_address(&addr, namespace, digest).await {
                Ok(metainfo) => {
                    self.ring.mark_healthy(&addr);
                    return Ok(metainfo);
                }
                Err(err @ Error::NotFound { .. }) => return Err(err),
                Err(err) => {
                    warn!(addr = %addr, "metainfo poll failed, trying next ring address: {err}");
                    self.ring.mark_failed(&addr);
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(Error::Timeout {
            elapsed_ms: 0,
            location: std::panic::Location::caller(),
        }))
    }

    async fn poll_one_address(&self, addr: &Url, namespace: &str, digest: &Digest) -> Result<MetaInfo, Error> {
        let url = format!("{addr}namespace/{namespace}/blobs/{digest}/metainfo");
        let deadline = Instant::now() + Duration::from_millis(self.config.poll_budget_ms);
        let backoff = self.backoff();
        let poller = http::PollAccepted::new(self.http.clone());

        let mut attempt = 0;
        loop {
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    elapsed_ms: self.config.poll_budget_ms,
                    location: std::panic::Location::caller(),
                });
            }

            match poller.poll_once(&url, Duration::from_secs(10)).await {
                Ok(Some(body)) => return deserialize(&body),
                Ok(None) => {
                    debug!(url, "metainfo poll accepted, retrying after backoff");
                }
                Err(err @ Error::NotFound { .. }) => return Err(err),
                Err(err) => return Err(err),
            }

            tokio::time::sleep(backoff.interval_for(attempt)).await;
            attempt += 1;
        }
    }
}

/// Deserializes the wire form and re-derives `InfoHash` from the bencoded
/// `info` (never trusting the JSON alone); re-parses `Name` as a `Digest`.
fn deserialize(body: &[u8]) -> Result<MetaInfo, Error> {
    let metainfo: MetaInfo = serde_json::from_slice(body).map_err(|source| Error::Integrity {
        digest: Digest::of_bytes(body),
        reason: source.to_string(),
        location: std::panic::Location::caller(),
    })?;

    Digest::parse(metainfo.name()).map_err(|source| Error::Integrity {
        digest: Digest::of_bytes(metainfo.name().as_bytes()),
        reason: source.to_string(),
        location: std::panic::Location::caller(),
    })?;

    metainfo.info_hash().map_err(|source| Error::Integrity {
        digest: Digest::of_bytes(metainfo.name().as_bytes()),
        reason: source.to_string(),
        location: std::panic::Location::caller(),
    })?;

    Ok(metainfo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_rejects_a_name_that_is_not_a_valid_digest() {
        let body = br#"{"Info":{"PieceLength":4,"PieceSums":[0],"Name":"not-a-digest","Length":4}}"#;
        assert!(matches!(deserialize(body), Err(Error::Integrity { .. })));
    }

    #[tokio::test]
    async fn fetch_against_an_empty_ring_times_out_immediately() {
        let client = MetainfoClient::new(MetainfoClientConfig::default());
        let digest = kraken_test_helpers::fixtures::digest(1);
        assert!(matches!(client.fetch("default", &digest).await, Err(Error::Timeout { .. })));
    }
}

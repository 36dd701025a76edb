//! Shared HTTP transport contract used by every network edge (the metainfo
//! client, and anything that polls an origin store).
pub mod params;
pub mod retry;

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use tracing::warn;

use crate::error::Error;

/// Everything needed to describe one outbound request, independent of
/// which collaborator sends it.
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    pub accepted_statuses: HashSet<u16>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Request {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            accepted_statuses: HashSet::from([200]),
            headers: Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// How a response's status resolved, independent of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Accepted,
    Accepted202,
    NotFound,
    Conflict,
    Forbidden,
    Status5xx,
    StatusError,
}

#[must_use]
pub fn classify(status: StatusCode, accepted: &HashSet<u16>) -> StatusOutcome {
    if accepted.contains(&status.as_u16()) {
        return StatusOutcome::Accepted;
    }
    match status {
        StatusCode::ACCEPTED => StatusOutcome::Accepted202,
        StatusCode::NOT_FOUND => StatusOutcome::NotFound,
        StatusCode::CONFLICT => StatusOutcome::Conflict,
        StatusCode::FORBIDDEN => StatusOutcome::Forbidden,
        s if s.is_server_error() => StatusOutcome::Status5xx,
        _ => StatusOutcome::StatusError,
    }
}

/// A GET that treats 202 as "continue polling" and anything else as
/// terminal (success body, or an error).
pub struct PollAccepted {
    client: reqwest::Client,
}

impl PollAccepted {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Sends one GET. Returns `Ok(Some(body))` on 200, `Ok(None)` on 202
    /// (keep polling), or an [`Error`] for anything else.
    pub async fn poll_once(&self, url: &str, timeout: Duration) -> Result<Option<Vec<u8>>, Error> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| network_error(url, source))?;

        match classify(response.status(), &HashSet::from([200])) {
            StatusOutcome::Accepted => {
                let body = response.bytes().await.map_err(|source| network_error(url, source))?;
                Ok(Some(body.to_vec()))
            }
            StatusOutcome::Accepted202 => Ok(None),
            StatusOutcome::NotFound => Err(Error::NotFound {
                digest: kraken_primitives::digest::Digest::of_bytes(url.as_bytes()),
                location: std::panic::Location::caller(),
            }),
            StatusOutcome::Status5xx => Err(Error::Status5xx {
                addr: url.to_owned(),
                status: response.status().as_u16(),
                location: std::panic::Location::caller(),
            }),
            StatusOutcome::Conflict | StatusOutcome::Forbidden | StatusOutcome::StatusError => {
                warn!(url, status = %response.status(), "unexpected status polling upstream");
                Err(Error::Status5xx {
                    addr: url.to_owned(),
                    status: response.status().as_u16(),
                    location: std::panic::Location::caller(),
                })
            }
        }
    }
}

fn network_error(addr: &str, source: reqwest::Error) -> Error {
    Error::Network {
        addr: addr.to_owned(),
        source: kraken_located_error::Located(Box::new(source) as Box<dyn std::error::Error + Send + Sync>).into(),
        location: std::panic::Location::caller(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_distinguishes_accepted_from_202_from_5xx() {
        let accepted = HashSet::from([200]);
        assert_eq!(classify(StatusCode::OK, &accepted), StatusOutcome::Accepted);
        assert_eq!(classify(StatusCode::ACCEPTED, &accepted), StatusOutcome::Accepted202);
        assert_eq!(classify(StatusCode::INTERNAL_SERVER_ERROR, &accepted), StatusOutcome::Status5xx);
        assert_eq!(classify(StatusCode::NOT_FOUND, &accepted), StatusOutcome::NotFound);
    }
}

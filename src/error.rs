//! Error kinds shared across Kraken's coordination tier.
//!
//! Error | Context | Description
//! ---|---|---
//! `Validation` | any request | The caller supplied a malformed digest, info-hash, or peer descriptor.
//! `NotFound` | file store, cache | The requested blob or metainfo is not known to this node.
//! `Conflict` | file store | The blob already exists in a state that rejects the requested transition.
//! `StateError` | file store | The blob is not in a state that allows the requested operation.
//! `RefCountError` | file store | A reference count would have gone negative.
//! `Network` | metainfo client | The ring could not be reached.
//! `Status5xx` | metainfo client, tracker | A peer or upstream returned a server error.
//! `Accepted` | metainfo client | The request was accepted but work is still pending (HTTP 202).
//! `Timeout` | metainfo client | The poll budget was exhausted before the upstream finished.
//! `Integrity` | file store, cache | A digest did not match its content.
use std::panic::Location;

use kraken_located_error::LocatedError;
use kraken_primitives::digest::Digest;

pub type DynError = LocatedError<'static, dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("validation failed: {source}, {location}")]
    Validation {
        source: DynError,
        location: &'static Location<'static>,
    },

    #[error("not found: {digest}, {location}")]
    NotFound {
        digest: Digest,
        location: &'static Location<'static>,
    },

    #[error("conflict for {digest}: {reason}, {location}")]
    Conflict {
        digest: Digest,
        reason: String,
        location: &'static Location<'static>,
    },

    #[error("{digest} is not in a state that allows this operation: {reason}, {location}")]
    StateError {
        digest: Digest,
        reason: String,
        location: &'static Location<'static>,
    },

    #[error("reference count for {digest} would go negative, {location}")]
    RefCountError {
        digest: Digest,
        location: &'static Location<'static>,
    },

    #[error("network error reaching {addr}: {source}, {location}")]
    Network {
        addr: String,
        source: DynError,
        location: &'static Location<'static>,
    },

    #[error("upstream {addr} returned {status}, {location}")]
    Status5xx {
        addr: String,
        status: u16,
        location: &'static Location<'static>,
    },

    #[error("upstream {addr} accepted the request but has not finished, {location}")]
    Accepted {
        addr: String,
        location: &'static Location<'static>,
    },

    #[error("poll budget exhausted after {elapsed_ms}ms, {location}")]
    Timeout {
        elapsed_ms: u64,
        location: &'static Location<'static>,
    },

    #[error("integrity check failed for {digest}: {reason}, {location}")]
    Integrity {
        digest: Digest,
        reason: String,
        location: &'static Location<'static>,
    },
}

impl Error {
    /// Maps this error to the HTTP status code the tracker and metainfo
    /// client surface to their own callers.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::Conflict { .. } => 409,
            Error::StateError { .. } => 409,
            Error::RefCountError { .. } => 409,
            Error::Accepted { .. } => 202,
            Error::Timeout { .. } => 504,
            Error::Network { .. } | Error::Status5xx { .. } => 502,
            Error::Integrity { .. } => 422,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = Error::NotFound {
            digest: Digest::of_bytes(b"x"),
            location: Location::caller(),
        };
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn accepted_maps_to_202() {
        let err = Error::Accepted {
            addr: "ring-a".to_owned(),
            location: Location::caller(),
        };
        assert_eq!(err.status_code(), 202);
    }
}

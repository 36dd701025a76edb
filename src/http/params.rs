//! Parameter-extraction helpers shared by every HTTP-facing handler.
//!
//! All of these return [`Error::Validation`] (mapped to HTTP 400 at the
//! boundary) on malformed input, rather than panicking.
use std::net::IpAddr;
use std::panic::Location;

use kraken_primitives::digest::Digest;

use crate::error::Error;

pub fn require_digest(raw: &str) -> Result<Digest, Error> {
    Digest::parse(raw).map_err(|source| Error::Validation {
        source: kraken_located_error::Located(Box::new(source) as Box<dyn std::error::Error + Send + Sync>).into(),
        location: Location::caller(),
    })
}

pub fn require_ip(raw: &str) -> Result<IpAddr, Error> {
    if raw.is_empty() {
        return Err(validation("ip must not be empty"));
    }
    raw.parse().map_err(|_| validation(&format!("\"{raw}\" is not a valid ip address")))
}

pub fn require_port(raw: u16) -> Result<u16, Error> {
    if raw == 0 {
        return Err(validation("port must not be zero"));
    }
    Ok(raw)
}

fn validation(message: &str) -> Error {
    Error::Validation {
        source: kraken_located_error::Located(Box::new(std::io::Error::other(message.to_owned())) as Box<dyn std::error::Error + Send + Sync>).into(),
        location: Location::caller(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_ip_rejects_empty_and_malformed_input() {
        assert!(require_ip("").is_err());
        assert!(require_ip("not-an-ip").is_err());
        assert!(require_ip("127.0.0.1").is_ok());
    }

    #[test]
    fn require_port_rejects_zero() {
        assert!(require_port(0).is_err());
        assert!(require_port(6881).is_ok());
    }

    #[test]
    fn require_digest_rejects_malformed_digests() {
        assert!(require_digest("not-a-digest").is_err());
    }
}

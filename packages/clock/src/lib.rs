//! Time related functions and types shared by the peer store, the metainfo
//! client backoff loop, and the file store's TTL-driven eviction.
//!
//! It's usually a good idea to control where the time comes from in an
//! application so that it can be mocked for testing and it can be controlled
//! in production so we get the intended behavior without relying on the
//! specific time zone for the underlying system.
//!
//! Clocks use the type `DurationSinceUnixEpoch`, which is a
//! `std::time::Duration` since the Unix Epoch (timestamp). The timestamp
//! does not depend on the time zone, which gives the ability to use the
//! clock regardless of the underlying system time zone configuration.

pub mod clock;
pub mod conv;
pub mod static_time;

#[macro_use]
extern crate lazy_static;

/// Working version, for production.
#[cfg(not(test))]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Working;

/// Stopped version, for testing.
#[cfg(test)]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Stopped;

//! Servers: the tracker/announce HTTP server and shared shutdown signaling.
pub mod signals;
pub mod tracker;

//! Configuration factories for testing.
use kraken_configuration::Configuration;

/// Ephemeral configuration: binds everything to port 0 so concurrently
/// running tests never collide on a fixed port, and uses a fresh temp
/// directory as the file store root.
///
/// > **NOTICE**: This configuration is not meant to be used in production.
#[must_use]
pub fn ephemeral() -> Configuration {
    let mut config = Configuration::default();

    config.tracker.bind_address = "127.0.0.1:0".to_owned();

    let temp_dir = std::env::temp_dir().join(format!("kraken-test-{}", crate::random::string(16)));
    config.file_store.root_dir = camino::Utf8PathBuf::from_path_buf(temp_dir).expect("temp dir path must be valid UTF-8");

    config
}

/// Ephemeral configuration backed by Redis instead of the in-memory peer
/// store, pointed at `redis_addr`.
#[must_use]
pub fn ephemeral_with_redis(redis_addr: &str) -> Configuration {
    let mut config = ephemeral();
    config.peer_store.redis_addr = Some(redis_addr.to_owned());
    config
}

//! Setup for the main application: loads configuration, initializes
//! tracing, and builds the `AppState` the tracker server runs against.
//!
//! [`setup`] only builds the application and its dependencies; it does not
//! start serving. See [`crate::app::run`] for that.
use std::sync::Arc;

use kraken_clock::static_time;
use kraken_configuration::Configuration;
use kraken_peer_store::local::LocalPeerStore;

use super::config::initialize_configuration;
use crate::cache::MemoryCache;
use crate::handout;
use crate::servers::tracker::origin_store::{CachedOriginStore, OriginStore};
use crate::servers::tracker::AppState;

/// Loads configuration from the environment and sets up tracing.
#[must_use]
pub fn config(default_path: &std::path::Path) -> Configuration {
    let config = initialize_configuration(default_path);
    super::tracing::setup(&config);
    config
}

/// An `OriginStore` with no backing replication tier: every digest has no
/// origin peers. Used until a real storage-backend adapter is wired in
/// (out of scope for this subsystem).
struct NoOrigins;

#[async_trait::async_trait]
impl OriginStore for NoOrigins {
    async fn origin_peers(&self, _info_hash: kraken_primitives::info_hash::InfoHash) -> Vec<kraken_primitives::peer::PeerInfo> {
        Vec::new()
    }
}

/// Builds the application state the tracker server runs against.
///
/// # Panics
///
/// Panics if `configuration` names a handout policy that is not one of the
/// closed set of registered names.
#[must_use]
pub fn build(configuration: &Configuration) -> Arc<AppState> {
    initialize_static();

    let peer_store = Arc::new(LocalPeerStore::new(configuration.peer_store.window_width_secs, configuration.peer_store.max_windows));
    peer_store.spawn_sweeper();

    Arc::new(AppState {
        peer_store,
        origin_store: CachedOriginStore::new(Box::new(NoOrigins) as Box<dyn OriginStore>, std::time::Duration::from_secs(5)),
        handout_policy: handout::policy_by_name("completeness").expect("\"completeness\" is a registered handout policy"),
        metainfo_cache: MemoryCache::new(configuration.cache.capacity_bytes),
        backend_transfer: None,
        max_peers_per_announce: 50,
        metrics: Box::new(crate::metrics::NoopMetrics),
    })
}

/// Initializes static, process-wide values: the time the application
/// started, used by any clock-relative diagnostics.
fn initialize_static() {
    lazy_static::initialize(&static_time::TIME_AT_APP_START);
}

//! The announce/tracker HTTP server: `GET /announce` and
//! `GET /namespace/:ns/blobs/:digest/metainfo`.
pub mod announce;
pub mod metainfo;
pub mod origin_store;
pub mod task_runner;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use kraken_peer_store::PeerStore;
use kraken_primitives::metainfo::MetaInfo;

use crate::cache::MemoryCache;
use crate::handout::AssignPriority;
use crate::metrics::Metrics;
use metainfo::BackendTransfer;
use origin_store::CachedOriginStore;

pub struct AppState {
    pub peer_store: Arc<dyn PeerStore>,
    pub origin_store: CachedOriginStore<Box<dyn origin_store::OriginStore>>,
    pub handout_policy: Box<dyn AssignPriority>,
    pub metainfo_cache: MemoryCache<MetaInfo>,
    pub backend_transfer: Option<Box<dyn BackendTransfer>>,
    pub max_peers_per_announce: usize,
    pub metrics: Box<dyn Metrics>,
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/announce", get(announce::handle))
        .route("/namespace/:ns/blobs/:digest/metainfo", get(metainfo::handle))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use kraken_configuration::Configuration;

    use super::*;
    use crate::handout::DefaultPolicy;

    struct NoOriginPeers;

    #[async_trait::async_trait]
    impl origin_store::OriginStore for NoOriginPeers {
        async fn origin_peers(&self, _info_hash: kraken_primitives::info_hash::InfoHash) -> Vec<kraken_primitives::peer::PeerInfo> {
            Vec::new()
        }
    }

    fn state() -> Arc<AppState> {
        let config = Configuration::default();
        Arc::new(AppState {
            peer_store: Arc::new(kraken_peer_store::local::LocalPeerStore::new(
                config.peer_store.window_width_secs,
                config.peer_store.max_windows,
            )),
            origin_store: CachedOriginStore::new(Box::new(NoOriginPeers) as Box<dyn origin_store::OriginStore>, std::time::Duration::from_secs(5)),
            handout_policy: Box::new(DefaultPolicy),
            metainfo_cache: MemoryCache::new(config.cache.capacity_bytes),
            backend_transfer: None,
            max_peers_per_announce: 50,
            metrics: Box::new(crate::metrics::NoopMetrics),
        })
    }

    #[test]
    fn router_registers_both_routes() {
        let _ = router(state());
    }
}

//! `GET /announce` handler.
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kraken_peer_store::PeerStore;
use kraken_primitives::info_hash::InfoHash;
use kraken_primitives::peer::{Origin, PeerContext, PeerId, PeerInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AppState;
use crate::error::Error;
use crate::handout::{self, Candidate};
use crate::http::params;

#[derive(Debug, Deserialize)]
pub struct AnnounceQuery {
    info_hash: String,
    peer_id: String,
    ip: String,
    port: u16,
    complete: bool,
    #[serde(default)]
    zone: String,
    #[serde(default)]
    cluster: String,
}

#[derive(Debug, Serialize)]
pub struct AnnounceResponsePeer {
    pub peer_id: String,
    pub ip: std::net::IpAddr,
    pub port: u16,
    pub complete: bool,
}

pub async fn handle(State(state): State<Arc<AppState>>, Query(query): Query<AnnounceQuery>) -> Response {
    match handle_announce(&state, &query).await {
        Ok(peers) => Json(peers).into_response(),
        Err(err) => (axum::http::StatusCode::from_u16(err.status_code()).unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR), err.to_string()).into_response(),
    }
}

async fn handle_announce(state: &AppState, query: &AnnounceQuery) -> Result<Vec<AnnounceResponsePeer>, Error> {
    let ip = params::require_ip(&query.ip)?;
    let port = params::require_port(query.port)?;

    let info_hash: InfoHash = query.info_hash.parse().map_err(|_| Error::Validation {
        source: kraken_located_error::Located(Box::new(std::io::Error::other("invalid info_hash")) as Box<dyn std::error::Error + Send + Sync>).into(),
        location: std::panic::Location::caller(),
    })?;
    let peer_id: PeerId = query.peer_id.parse().map_err(|_| Error::Validation {
        source: kraken_located_error::Located(Box::new(std::io::Error::other("invalid peer_id")) as Box<dyn std::error::Error + Send + Sync>).into(),
        location: std::panic::Location::caller(),
    })?;

    let context = PeerContext {
        peer_id,
        ip,
        port,
        zone: query.zone.clone(),
        cluster: query.cluster.clone(),
        origin: Origin::Peer,
    };

    let announcing_peer = PeerInfo::from_context(&context, query.complete);
    state.peer_store.announce(info_hash, announcing_peer).await;
    debug!(%info_hash, %peer_id, "announce");

    let sampled = state.peer_store.sample(info_hash, state.max_peers_per_announce).await;
    let origins = state.origin_store.origin_peers(info_hash).await;

    let candidates: Vec<Candidate> = origins
        .into_iter()
        .chain(sampled)
        .map(|p| Candidate::new(p.peer_id, p.ip, p.port, None, p.complete, p.origin))
        .collect();

    let ranked = handout::sort_peers(state.handout_policy.as_ref(), &context, candidates, state.metrics.as_ref())?;

    Ok(ranked
        .into_iter()
        .map(|c| AnnounceResponsePeer {
            peer_id: c.peer_id.to_string(),
            ip: c.ip,
            port: c.port,
            complete: c.complete,
        })
        .collect())
}

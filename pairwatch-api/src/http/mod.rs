// HTTP API module
//
// Provides the REST endpoints and the realtime relay upgrade using axum

pub mod content;
pub mod error;
pub mod health;
pub mod middleware;
pub mod room;
pub mod site;
pub mod video;
pub mod websocket;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use pairwatch_core::{
    bootstrap::Services,
    config::RelayConfig,
    service::{CatalogService, RoomService, SiteGate, TokenService},
    Config,
};
use pairwatch_relay::{ConnectionLimits, ConnectionManager, RoomMessageHub};

pub use error::{AppError, AppResult};
pub use middleware::{RoomViewer, SiteViewer};

/// Headroom above the largest accepted file for the rest of the multipart form
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shortest server heartbeat, whatever the idle timeout
const MIN_HEARTBEAT: Duration = Duration::from_millis(100);

/// Relay settings the WebSocket handler needs per connection
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub auth_timeout: Duration,
    pub max_message_bytes: usize,
    /// Protocol ping period; a third of the idle timeout so two pings can be missed
    pub heartbeat_interval: Duration,
}

impl From<&RelayConfig> for RelaySettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            auth_timeout: Duration::from_secs(config.auth_timeout_seconds),
            max_message_bytes: config.max_message_bytes,
            heartbeat_interval: (Duration::from_secs(config.idle_timeout_seconds) / 3)
                .max(MIN_HEARTBEAT),
        }
    }
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub site_gate: SiteGate,
    pub tokens: TokenService,
    pub catalog: CatalogService,
    pub rooms: RoomService,
    pub hub: RoomMessageHub,
    pub connections: ConnectionManager,
    pub relay: Arc<RelaySettings>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire the core services to a fresh relay
    #[must_use]
    pub fn new(services: Services, config: &Config) -> Self {
        let hub = RoomMessageHub::new(services.rooms.capacity(), config.relay.outbound_buffer);
        let connections = ConnectionManager::new(ConnectionLimits::from(&config.relay));

        Self {
            site_gate: services.site_gate,
            tokens: services.tokens,
            catalog: services.catalog,
            rooms: services.rooms,
            hub,
            connections,
            relay: Arc::new(RelaySettings::from(&config.relay)),
            max_upload_bytes: config.storage.max_upload_bytes,
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, client_url: Option<&str>) -> Router {
    let upload_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    let content_routes = Router::new()
        .route(
            "/api/content",
            get(content::list_content)
                .post(content::upload_content)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/content/{id}", delete(content::delete_content))
        .route("/api/content/{id}/stream", get(content::stream_url))
        .route("/api/content/{id}/thumbnail", get(content::thumbnail_url));

    let room_routes = Router::new()
        .route("/api/rooms", post(room::create_room))
        .route("/api/room-auth", post(room::room_auth))
        .route("/api/room-leave", post(room::room_leave))
        .route("/api/video/{room_id}/{*video_key}", get(video::video_url));

    Router::new()
        .merge(health::create_health_router())
        .route("/api/site-auth", post(site::site_auth))
        .merge(content_routes)
        .merge(room_routes)
        .route("/ws", get(websocket::websocket_handler))
        .layer(cors_layer(client_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match client_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(AllowOrigin::exact(origin)),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid server.client_url ({}), allowing any origin", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

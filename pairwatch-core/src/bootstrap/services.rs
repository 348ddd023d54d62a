//! Service initialization and dependency injection

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    repository::{RoomRepository, SessionRepository, VideoRepository},
    service::{CatalogService, MediaStorage, PasswordService, RoomService, SiteGate, TokenService},
    Config,
};

/// Container for all initialized services
#[derive(Clone, Debug)]
pub struct Services {
    /// Site password check
    pub site_gate: SiteGate,
    /// Site and room token signing
    pub tokens: TokenService,
    /// Video catalog and signed URLs
    pub catalog: CatalogService,
    /// Rooms and seats
    pub rooms: RoomService,
}

/// Initialize all core services and seed the catalog and rooms
pub async fn init_services(config: &Config) -> Result<Services> {
    info!("Initializing services...");

    let passwords = PasswordService::new(config.auth.password_hash);

    let secret = if config.auth.jwt_secret.is_empty() {
        warn!("auth.jwt_secret is not set, tokens will not survive a restart");
        TokenService::generate_secret()
    } else {
        config.auth.jwt_secret.clone()
    };
    let tokens = TokenService::new(
        secret.as_bytes(),
        config.auth.site_token_ttl_seconds,
        config.auth.room_token_ttl_seconds,
    );

    let site_gate = SiteGate::new(&config.auth.site_password, passwords).await?;

    let storage = MediaStorage::from_config(&config.storage)?;
    let catalog = CatalogService::new(VideoRepository::new(), storage, &config.storage);
    catalog.seed(&config.catalog.videos);

    let rooms = RoomService::new(
        RoomRepository::new(),
        SessionRepository::new(),
        catalog.clone(),
        passwords,
        tokens.clone(),
        config.relay.max_per_room,
    );
    let seeded = rooms.seed(&config.rooms).await?;
    info!("Seeded {} room(s)", seeded);

    info!("Services initialized");
    Ok(Services {
        site_gate,
        tokens,
        catalog,
        rooms,
    })
}

use chrono::{DateTime, Duration, Utc};

use super::{auth::RoomClaims, CatalogService, PasswordService, TokenService};
use crate::{
    config::{RoomSeed, MAX_ROOM_OCCUPANTS},
    models::{ConnectionId, NewRoom, Room, RoomId, RoomSession, RoomSummary, SessionId, VideoId},
    repository::{RoomRepository, SessionRepository},
    validation, Error, Result,
};

/// Result of a successful room login
#[derive(Debug, Clone)]
pub struct RoomAccess {
    pub room: RoomSummary,
    pub session: RoomSession,
    pub token: String,
}

/// Rooms and their seats
#[derive(Clone)]
pub struct RoomService {
    rooms: RoomRepository,
    sessions: SessionRepository,
    catalog: CatalogService,
    passwords: PasswordService,
    tokens: TokenService,
    capacity: usize,
}

impl std::fmt::Debug for RoomService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomService")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl RoomService {
    #[must_use]
    pub fn new(
        rooms: RoomRepository,
        sessions: SessionRepository,
        catalog: CatalogService,
        passwords: PasswordService,
        tokens: TokenService,
        capacity: usize,
    ) -> Self {
        Self {
            rooms,
            sessions,
            catalog,
            passwords,
            tokens,
            capacity: capacity.clamp(1, MAX_ROOM_OCCUPANTS),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    async fn insert(&self, name: &str, password: &str, video_key: String) -> Result<Room> {
        validation::validate_room_name(name)?;
        validation::validate_room_password(password)?;

        let password_hash = self.passwords.hash(password).await?;
        self.rooms.create(NewRoom {
            name: name.to_string(),
            password_hash,
            video_key,
        })
    }

    /// Create the configured rooms at startup; duplicates are skipped
    pub async fn seed(&self, seeds: &[RoomSeed]) -> Result<usize> {
        let mut created = 0;
        for seed in seeds {
            match self
                .insert(&seed.name, &seed.password, seed.video_key.clone())
                .await
            {
                Ok(room) => {
                    tracing::info!(room_id = %room.id, "Seeded room '{}'", room.name);
                    created += 1;
                }
                Err(Error::AlreadyExists(_)) => {
                    tracing::warn!("Skipping duplicate room seed '{}'", seed.name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    /// Create a room showing a catalog video
    pub async fn create(&self, name: &str, password: &str, content_id: VideoId) -> Result<Room> {
        validation::validate_room_name(name)?;
        validation::validate_room_password(password)?;

        if self.rooms.get_by_name(name).is_some() {
            return Err(Error::AlreadyExists("Room name already exists".to_string()));
        }
        let video = self.catalog.get(content_id)?;

        let room = self.insert(name, password, video.file_key).await?;
        tracing::info!(room_id = %room.id, content_id = %content_id, "Created room '{}'", room.name);
        Ok(room)
    }

    /// Check a room's password and take one of its seats
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<RoomAccess> {
        let room = self
            .rooms
            .get_by_name(name)
            .ok_or_else(|| Error::NotFound("Room not found".to_string()))?;

        if !self.passwords.verify(password, &room.password_hash).await? {
            return Err(Error::Authentication("Invalid password".to_string()));
        }

        let session = self.sessions.open(room.id, self.capacity)?;
        let token = match self.tokens.sign_room_token(&session.id, room.id) {
            Ok(token) => token,
            Err(e) => {
                self.sessions.close(&session.id);
                return Err(e);
            }
        };

        tracing::info!(room_id = %room.id, session_id = %session.id, "Viewer joined room");
        Ok(RoomAccess {
            room: RoomSummary::from(&room),
            session,
            token,
        })
    }

    /// Give up a seat
    pub fn leave(&self, session_id: &SessionId) -> Result<RoomSession> {
        let session = self
            .sessions
            .close(session_id)
            .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;
        tracing::info!(room_id = %session.room_id, session_id = %session.id, "Viewer left room");
        Ok(session)
    }

    pub fn get(&self, room_id: RoomId) -> Result<Room> {
        self.rooms
            .get_by_id(room_id)
            .ok_or_else(|| Error::NotFound("Room not found".to_string()))
    }

    /// Resolve a room token to a live seat
    pub fn session_for(&self, claims: &RoomClaims) -> Result<RoomSession> {
        match self.sessions.get(&claims.session_id) {
            Some(session) if session.room_id == claims.room_id => Ok(session),
            _ => Err(Error::Authentication("Session expired".to_string())),
        }
    }

    /// Bind a relay connection to a seat
    pub fn attach(&self, session_id: &SessionId, connection_id: ConnectionId) -> Result<()> {
        self.sessions.attach(session_id, connection_id)
    }

    /// Unbind a relay connection; ignored if the seat moved to a newer connection
    pub fn detach(&self, session_id: &SessionId, connection_id: &ConnectionId) -> bool {
        self.sessions.detach(session_id, connection_id)
    }

    pub fn touch(&self, session_id: &SessionId) {
        self.sessions.touch(session_id);
    }

    /// Signed URL for a room's video, only for that room's own seats
    pub async fn video_url(&self, claims: &RoomClaims, room_id: RoomId, video_key: &str) -> Result<String> {
        let room = self.get(room_id)?;
        if claims.room_id != room.id || room.video_key != video_key {
            return Err(Error::Authorization("Access denied".to_string()));
        }
        self.sessions.touch(&claims.session_id);
        self.catalog.video_key_url(video_key).await
    }

    /// Free seats left behind by viewers who never came back, and seats
    /// older than a room token
    ///
    /// Returned sessions may still have a live connection that the caller
    /// has to drop.
    pub fn prune_sessions(
        &self,
        now: DateTime<Utc>,
        idle_grace: Duration,
        max_age: Duration,
    ) -> Vec<RoomSession> {
        let pruned = self.sessions.prune(now, idle_grace, max_age);
        for session in &pruned {
            tracing::debug!(room_id = %session.room_id, session_id = %session.id, "Pruned stale session");
        }
        pruned
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{RoomId, SessionId};
use super::ConnectionId;

/// A passworded pairing of two viewers around one video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub video_key: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a room; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub password_hash: String,
    pub video_key: String,
}

/// Public view of a room handed to a viewer after room auth
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub video_key: String,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            video_key: room.video_key.clone(),
        }
    }
}

/// One of a room's seats
#[derive(Debug, Clone)]
pub struct RoomSession {
    pub id: SessionId,
    pub room_id: RoomId,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Live relay connection currently bound to this seat
    pub connection: Option<ConnectionId>,
}

impl RoomSession {
    #[must_use]
    pub fn new(room_id: RoomId) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            room_id,
            created_at: now,
            last_seen: now,
            connection: None,
        }
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.connection.is_some()
    }
}

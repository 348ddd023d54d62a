//! JSON wire protocol spoken on the relay WebSocket

use chrono::{DateTime, Utc};
use pairwatch_core::models::{PlaybackState, RoomId, SessionId, SyncAction};
use serde::{Deserialize, Serialize};

/// Messages sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Present a room token; `room_id`, when given, must match the token
    Auth {
        token: String,
        room_id: Option<RoomId>,
    },
    Sync {
        action: SyncAction,
    },
    Ping,
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    AuthResult {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<SessionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A peer's play/pause/seek, relayed verbatim
    Sync {
        action: SyncAction,
        room_id: RoomId,
        sender_id: SessionId,
    },
    /// Presence of a room occupant
    Status {
        room_id: RoomId,
        online: bool,
        user_id: SessionId,
    },
    /// Last known playback state, sent to a newcomer
    State {
        room_id: RoomId,
        position: f64,
        is_playing: bool,
        updated_by: SessionId,
    },
    Pong,
    Error {
        message: String,
    },
}

impl ServerMessage {
    #[must_use]
    pub fn auth_ok(user_id: SessionId) -> Self {
        Self::AuthResult {
            success: true,
            user_id: Some(user_id),
            error: None,
        }
    }

    #[must_use]
    pub fn auth_failed(error: impl Into<String>) -> Self {
        Self::AuthResult {
            success: false,
            user_id: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Snapshot with the position advanced to `now` if playing
    #[must_use]
    pub fn state(playback: &PlaybackState, now: DateTime<Utc>) -> Self {
        Self::State {
            room_id: playback.room_id,
            position: playback.estimated_position(now),
            is_playing: playback.is_playing,
            updated_by: playback.updated_by.clone(),
        }
    }

    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::AuthResult { .. } => "auth_result",
            Self::Sync { .. } => "sync",
            Self::Status { .. } => "status",
            Self::State { .. } => "state",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

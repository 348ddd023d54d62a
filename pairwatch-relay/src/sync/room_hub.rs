use chrono::Utc;
use dashmap::DashMap;
use pairwatch_core::models::{ConnectionId, PlaybackState, RoomId, SessionId, SyncAction};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::protocol::ServerMessage;
use crate::{RelayError, Result};

/// Message sender for a client connection
pub type MessageSender = mpsc::Sender<ServerMessage>;

/// A live connection seated in a room
#[derive(Debug, Clone)]
struct Occupant {
    connection_id: ConnectionId,
    session_id: SessionId,
    sender: MessageSender,
}

#[derive(Debug, Default)]
struct RoomState {
    occupants: Vec<Occupant>,
    /// Kept after the room empties so a returning pair can resume
    playback: Option<PlaybackState>,
}

/// What a newly joined connection needs to catch up
#[derive(Debug)]
pub struct JoinOutcome {
    /// Messages for this connection; closes when the hub drops it
    pub receiver: mpsc::Receiver<ServerMessage>,
    /// Sessions already present in the room
    pub peers: Vec<SessionId>,
    /// Last known playback state
    pub snapshot: Option<PlaybackState>,
    /// Older connection of the same session that this one replaced
    pub replaced: Option<ConnectionId>,
}

impl JoinOutcome {
    /// Catch-up messages for the newcomer: peer presence, then the playback snapshot
    #[must_use]
    pub fn catch_up(&self, room_id: RoomId) -> Vec<ServerMessage> {
        let mut messages: Vec<ServerMessage> = self
            .peers
            .iter()
            .map(|peer| ServerMessage::Status {
                room_id,
                online: true,
                user_id: peer.clone(),
            })
            .collect();
        if let Some(playback) = &self.snapshot {
            messages.push(ServerMessage::state(playback, Utc::now()));
        }
        messages
    }
}

/// In-memory hub routing relay messages between the occupants of each room
#[derive(Clone)]
pub struct RoomMessageHub {
    /// Map of room_id -> occupants and playback snapshot
    rooms: Arc<DashMap<RoomId, RoomState>>,

    /// Map of connection_id -> (room_id, session_id) for cleanup
    connections: Arc<DashMap<ConnectionId, (RoomId, SessionId)>>,

    /// Occupants allowed per room
    capacity: usize,

    /// Outbound queue length per connection
    buffer: usize,
}

impl RoomMessageHub {
    /// Create a new `RoomMessageHub`
    #[must_use]
    pub fn new(capacity: usize, buffer: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            connections: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
            buffer: buffer.max(1),
        }
    }

    /// Seat a connection in a room
    ///
    /// A session that is already present has its old connection replaced
    /// without an offline notice. Otherwise the join fails once the room holds
    /// `capacity` occupants.
    pub fn join(
        &self,
        room_id: RoomId,
        session_id: SessionId,
        connection_id: ConnectionId,
    ) -> Result<JoinOutcome> {
        let (tx, rx) = mpsc::channel(self.buffer);

        let (peers, snapshot, replaced) = {
            let mut room = self.rooms.entry(room_id).or_default();

            let replaced = room
                .occupants
                .iter()
                .position(|o| o.session_id == session_id)
                .map(|index| room.occupants.remove(index).connection_id);

            if replaced.is_none() && room.occupants.len() >= self.capacity {
                return Err(RelayError::RoomFull(self.capacity));
            }

            let peers: Vec<SessionId> = room
                .occupants
                .iter()
                .map(|o| o.session_id.clone())
                .collect();

            room.occupants.push(Occupant {
                connection_id: connection_id.clone(),
                session_id: session_id.clone(),
                sender: tx,
            });

            (peers, room.playback.clone(), replaced)
        };

        if let Some(old) = &replaced {
            self.connections.remove(old);
            info!(
                room_id = %room_id,
                session_id = %session_id,
                old_connection_id = %old,
                connection_id = %connection_id,
                "Connection replaced by reconnect"
            );
        }
        self.connections
            .insert(connection_id.clone(), (room_id, session_id.clone()));

        info!(
            room_id = %room_id,
            session_id = %session_id,
            connection_id = %connection_id,
            peers = peers.len(),
            "Client joined room"
        );

        self.broadcast_except(
            room_id,
            &ServerMessage::Status {
                room_id,
                online: true,
                user_id: session_id,
            },
            Some(&connection_id),
        );

        Ok(JoinOutcome {
            receiver: rx,
            peers,
            snapshot,
            replaced,
        })
    }

    /// Relay a play/pause/seek to every other occupant and record it
    ///
    /// Returns the number of peers the action was queued for.
    pub fn relay(&self, connection_id: &ConnectionId, action: SyncAction) -> Result<usize> {
        if !action.is_valid() {
            return Err(RelayError::InvalidAction(format!(
                "timestamp must be a finite number >= 0, got {}",
                action.timestamp
            )));
        }

        let (room_id, session_id) = self
            .connections
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or(RelayError::NotJoined)?;

        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            match room.playback.as_mut() {
                Some(playback) => playback.apply(action, session_id.clone()),
                None => {
                    room.playback = Some(PlaybackState::new(room_id, action, session_id.clone()));
                }
            }
        }

        debug!(
            room_id = %room_id,
            session_id = %session_id,
            action = ?action.kind,
            timestamp = action.timestamp,
            "Relaying sync action"
        );

        Ok(self.broadcast_except(
            room_id,
            &ServerMessage::Sync {
                action,
                room_id,
                sender_id: session_id,
            },
            Some(connection_id),
        ))
    }

    /// Remove a connection and tell the remaining occupants it went offline
    ///
    /// Returns `None` for connections that are unknown or were already
    /// replaced or removed, in which case nobody is notified.
    pub fn leave(&self, connection_id: &ConnectionId) -> Option<(RoomId, SessionId)> {
        let (_, (room_id, session_id)) = self.connections.remove(connection_id)?;

        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            room.occupants.retain(|o| o.connection_id != *connection_id);
        }

        info!(
            room_id = %room_id,
            session_id = %session_id,
            connection_id = %connection_id,
            "Client left room"
        );

        self.broadcast_except(
            room_id,
            &ServerMessage::Status {
                room_id,
                online: false,
                user_id: session_id.clone(),
            },
            None,
        );

        Some((room_id, session_id))
    }

    /// Remove whatever connection a session holds in a room
    pub fn remove_session(&self, room_id: RoomId, session_id: &SessionId) -> Option<ConnectionId> {
        let connection_id = self.rooms.get(&room_id).and_then(|room| {
            room.occupants
                .iter()
                .find(|o| o.session_id == *session_id)
                .map(|o| o.connection_id.clone())
        })?;
        self.leave(&connection_id).map(|_| connection_id)
    }

    /// Send to every occupant of a room except `exclude`
    ///
    /// Full queues drop the message; closed queues are removed afterwards.
    pub fn broadcast_except(
        &self,
        room_id: RoomId,
        message: &ServerMessage,
        exclude: Option<&ConnectionId>,
    ) -> usize {
        let mut sent_count = 0;
        let mut failed_connections = Vec::new();

        if let Some(room) = self.rooms.get(&room_id) {
            for occupant in &room.occupants {
                if exclude == Some(&occupant.connection_id) {
                    continue;
                }
                match occupant.sender.try_send(message.clone()) {
                    Ok(()) => sent_count += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            room_id = %room_id,
                            connection_id = %occupant.connection_id,
                            message_type = message.message_type(),
                            "Outbound queue full, dropping message"
                        );
                    }
                    Err(TrySendError::Closed(_)) => {
                        warn!(
                            room_id = %room_id,
                            connection_id = %occupant.connection_id,
                            "Failed to send message to client, marking for cleanup"
                        );
                        failed_connections.push(occupant.connection_id.clone());
                    }
                }
            }
        }

        // Clean up after the room ref is released
        for conn_id in failed_connections {
            self.leave(&conn_id);
        }

        sent_count
    }

    /// Number of live connections in a room
    #[must_use]
    pub fn occupant_count(&self, room_id: RoomId) -> usize {
        self.rooms.get(&room_id).map_or(0, |room| room.occupants.len())
    }

    /// Last known playback state of a room
    #[must_use]
    pub fn snapshot(&self, room_id: RoomId) -> Option<PlaybackState> {
        self.rooms.get(&room_id).and_then(|room| room.playback.clone())
    }

    /// Get total number of seated connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Drop every occupant; their receivers close and their handlers exit
    pub fn close_all(&self) {
        self.connections.clear();
        for mut room in self.rooms.iter_mut() {
            room.occupants.clear();
        }
        info!("All relay connections closed");
    }
}

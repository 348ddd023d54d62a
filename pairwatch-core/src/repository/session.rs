use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    models::{ConnectionId, RoomId, RoomSession, SessionId},
    Error, Result,
};

/// In-memory seat registry
///
/// Every check-then-insert runs under a single write lock, so two viewers
/// racing for the last seat cannot both get it.
#[derive(Clone, Default)]
pub struct SessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, RoomSession>>>,
}

impl SessionRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a seat in `room_id` unless `capacity` seats are taken
    pub fn open(&self, room_id: RoomId, capacity: usize) -> Result<RoomSession> {
        let mut sessions = self.sessions.write();

        let taken = sessions.values().filter(|s| s.room_id == room_id).count();
        if taken >= capacity {
            return Err(Error::Capacity(format!(
                "Room is full (maximum {capacity} users)"
            )));
        }

        let session = RoomSession::new(room_id);
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<RoomSession> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Bind a live connection to a seat, replacing any previous one
    pub fn attach(&self, session_id: &SessionId, connection_id: ConnectionId) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;
        session.connection = Some(connection_id);
        session.last_seen = Utc::now();
        Ok(())
    }

    /// Unbind a connection; a no-op when the seat has since moved to another connection
    pub fn detach(&self, session_id: &SessionId, connection_id: &ConnectionId) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.get_mut(session_id) {
            Some(session) if session.connection.as_ref() == Some(connection_id) => {
                session.connection = None;
                session.last_seen = Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn touch(&self, session_id: &SessionId) {
        if let Some(session) = self.sessions.write().get_mut(session_id) {
            session.last_seen = Utc::now();
        }
    }

    pub fn close(&self, session_id: &SessionId) -> Option<RoomSession> {
        self.sessions.write().remove(session_id)
    }

    #[must_use]
    pub fn count(&self, room_id: RoomId) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.room_id == room_id)
            .count()
    }

    /// Drop seats that were left detached for `idle_grace`, or that outlived `max_age`
    pub fn prune(
        &self,
        now: DateTime<Utc>,
        idle_grace: Duration,
        max_age: Duration,
    ) -> Vec<RoomSession> {
        let mut sessions = self.sessions.write();
        let expired: Vec<SessionId> = sessions
            .values()
            .filter(|s| {
                (!s.is_attached() && now - s.last_seen > idle_grace)
                    || now - s.created_at > max_age
            })
            .map(|s| s.id.clone())
            .collect();

        expired
            .iter()
            .filter_map(|id| sessions.remove(id))
            .collect()
    }
}

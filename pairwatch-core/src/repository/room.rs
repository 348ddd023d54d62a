use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{
    models::{NewRoom, Room, RoomId},
    Error, Result,
};

/// In-memory room store
///
/// Room ids are allocated serially from 1 and never reused.
#[derive(Clone, Default)]
pub struct RoomRepository {
    rooms: Arc<RwLock<BTreeMap<RoomId, Room>>>,
    next_id: Arc<AtomicU64>,
}

impl RoomRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a room; fails if an active room already uses the name
    pub fn create(&self, new_room: NewRoom) -> Result<Room> {
        let mut rooms = self.rooms.write();

        if rooms
            .values()
            .any(|r| r.is_active && r.name == new_room.name)
        {
            return Err(Error::AlreadyExists(
                "A room with this name already exists".to_string(),
            ));
        }

        let id = RoomId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let room = Room {
            id,
            name: new_room.name,
            password_hash: new_room.password_hash,
            video_key: new_room.video_key,
            is_active: true,
            created_at: Utc::now(),
        };
        rooms.insert(id, room.clone());
        Ok(room)
    }

    #[must_use]
    pub fn get_by_id(&self, room_id: RoomId) -> Option<Room> {
        self.rooms.read().get(&room_id).cloned()
    }

    /// Active room with this exact name
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Room> {
        self.rooms
            .read()
            .values()
            .find(|r| r.is_active && r.name == name)
            .cloned()
    }

    #[must_use]
    pub fn list(&self) -> Vec<Room> {
        self.rooms.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_room(name: &str) -> NewRoom {
        NewRoom {
            name: name.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            video_key: "sintel.mp4".to_string(),
        }
    }

    #[test]
    fn test_ids_are_serial() {
        let repo = RoomRepository::new();
        assert_eq!(repo.create(new_room("a")).unwrap().id, RoomId(1));
        assert_eq!(repo.create(new_room("b")).unwrap().id, RoomId(2));
    }

    #[test]
    fn test_duplicate_active_name() {
        let repo = RoomRepository::new();
        repo.create(new_room("friday")).unwrap();
        assert!(matches!(
            repo.create(new_room("friday")),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(repo.list().len(), 1);
        assert!(repo.create(new_room("Friday")).is_ok());
    }

    #[test]
    fn test_lookup() {
        let repo = RoomRepository::new();
        let room = repo.create(new_room("friday")).unwrap();
        assert_eq!(repo.get_by_name("friday").unwrap().id, room.id);
        assert_eq!(repo.get_by_id(room.id).unwrap().name, "friday");
        assert!(repo.get_by_id(RoomId(99)).is_none());
        assert_eq!(repo.list().len(), 1);
    }
}

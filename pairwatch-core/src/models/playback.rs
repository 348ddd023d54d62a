use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{RoomId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Play,
    Pause,
    Seek,
}

/// A play, pause or seek at a playback timestamp (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub timestamp: f64,
}

impl SyncAction {
    /// Timestamps must be finite and non-negative
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.timestamp.is_finite() && self.timestamp >= 0.0
    }
}

/// Last playback position reported in a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackState {
    pub room_id: RoomId,
    pub position: f64, // seconds
    pub is_playing: bool,
    pub updated_by: SessionId,
    pub updated_at: DateTime<Utc>,
}

impl PlaybackState {
    #[must_use]
    pub fn new(room_id: RoomId, action: SyncAction, updated_by: SessionId) -> Self {
        let mut state = Self {
            room_id,
            position: 0.0,
            is_playing: false,
            updated_by: updated_by.clone(),
            updated_at: Utc::now(),
        };
        state.apply(action, updated_by);
        state
    }

    pub fn apply(&mut self, action: SyncAction, updated_by: SessionId) {
        self.position = action.timestamp;
        match action.kind {
            ActionKind::Play => self.is_playing = true,
            ActionKind::Pause => self.is_playing = false,
            // Seeking keeps the play/pause state
            ActionKind::Seek => {}
        }
        self.updated_by = updated_by;
        self.updated_at = Utc::now();
    }

    /// Where playback should be at `now`, assuming nobody paused since the last update
    #[must_use]
    pub fn estimated_position(&self, now: DateTime<Utc>) -> f64 {
        if !self.is_playing {
            return self.position;
        }
        let elapsed = (now - self.updated_at).num_milliseconds().max(0) as f64 / 1000.0;
        self.position + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn action(kind: ActionKind, timestamp: f64) -> SyncAction {
        SyncAction { kind, timestamp }
    }

    #[test]
    fn test_action_wire_shape() {
        let parsed: SyncAction =
            serde_json::from_str(r#"{"type":"seek","timestamp":42.5}"#).unwrap();
        assert_eq!(parsed, action(ActionKind::Seek, 42.5));
        assert!(serde_json::from_str::<SyncAction>(r#"{"type":"rewind","timestamp":1}"#).is_err());
    }

    #[test]
    fn test_action_validation() {
        assert!(action(ActionKind::Play, 0.0).is_valid());
        assert!(!action(ActionKind::Play, -1.0).is_valid());
        assert!(!action(ActionKind::Seek, f64::NAN).is_valid());
        assert!(!action(ActionKind::Seek, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_apply_keeps_play_state_on_seek() {
        let alice = SessionId::from_string("alice".to_string());
        let bob = SessionId::from_string("bob".to_string());
        let mut state = PlaybackState::new(RoomId(1), action(ActionKind::Play, 10.0), alice);
        assert!(state.is_playing);

        state.apply(action(ActionKind::Seek, 95.0), bob.clone());
        assert!(state.is_playing);
        assert!((state.position - 95.0).abs() < f64::EPSILON);
        assert_eq!(state.updated_by, bob);

        state.apply(action(ActionKind::Pause, 96.0), bob);
        assert!(!state.is_playing);
    }

    #[test]
    fn test_estimated_position() {
        let viewer = SessionId::from_string("viewer".to_string());
        let mut state = PlaybackState::new(RoomId(1), action(ActionKind::Play, 30.0), viewer.clone());
        let later = state.updated_at + Duration::milliseconds(2500);
        assert!((state.estimated_position(later) - 32.5).abs() < 1e-9);

        state.apply(action(ActionKind::Pause, 31.0), viewer);
        let later = state.updated_at + Duration::seconds(60);
        assert!((state.estimated_position(later) - 31.0).abs() < f64::EPSILON);
    }
}

pub mod id;
pub mod playback;
pub mod room;
pub mod video;

pub use id::{generate_id, ConnectionId, RoomId, SessionId, VideoId};
pub use playback::{ActionKind, PlaybackState, SyncAction};
pub use room::{NewRoom, Room, RoomSession, RoomSummary};
pub use video::{sample_catalog, ContentKind, NewVideo, Video};

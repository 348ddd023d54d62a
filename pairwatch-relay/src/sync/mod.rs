// Module: sync

pub mod connection_manager;
pub mod protocol;
pub mod room_hub;

pub use connection_manager::{
    ConnectionInfo, ConnectionLimits, ConnectionManager, ConnectionMetrics,
};
pub use protocol::{ClientMessage, ServerMessage};
pub use room_hub::{JoinOutcome, MessageSender, RoomMessageHub};

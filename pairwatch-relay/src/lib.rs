//! Realtime playback relay
//!
//! Routes play/pause/seek actions and presence between the occupants of a
//! room. A room holds at most two live connections.

pub mod error;
pub mod sync;

pub use error::{RelayError, Result};
pub use sync::{
    ClientMessage, ConnectionInfo, ConnectionLimits, ConnectionManager, ConnectionMetrics,
    JoinOutcome, RoomMessageHub, ServerMessage,
};

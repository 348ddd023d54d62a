use dashmap::DashMap;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use pairwatch_core::{
    config::RelayConfig,
    models::{ConnectionId, RoomId},
};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{RelayError, Result};

/// Connection information
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub room_id: Option<RoomId>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub message_count: u64,
}

impl ConnectionInfo {
    #[must_use]
    pub fn new(connection_id: ConnectionId) -> Self {
        let now = Instant::now();
        Self {
            connection_id,
            room_id: None,
            connected_at: now,
            last_activity: now,
            message_count: 0,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    #[must_use]
    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Connection limits configuration
#[derive(Debug, Clone)]
pub struct ConnectionLimits {
    /// Maximum total connections
    pub max_total: usize,

    /// Idle timeout (disconnect if no inbound frame, protocol pongs included)
    pub idle_timeout: Duration,

    /// Inbound messages allowed per second per connection
    pub max_messages_per_second: u32,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self::from(&RelayConfig::default())
    }
}

impl From<&RelayConfig> for ConnectionLimits {
    fn from(config: &RelayConfig) -> Self {
        Self {
            max_total: config.max_total,
            idle_timeout: Duration::from_secs(config.idle_timeout_seconds),
            max_messages_per_second: config.max_messages_per_second,
        }
    }
}

/// Tracks live relay connections, their activity and message rate
#[derive(Clone)]
pub struct ConnectionManager {
    /// All active connections by `connection_id`
    connections: Arc<DashMap<ConnectionId, ConnectionInfo>>,

    /// Admitted connections; reserved before insert so `max_total` holds under races
    active: Arc<AtomicUsize>,

    /// Per-connection message rate (GCRA)
    limiter: Arc<DefaultKeyedRateLimiter<ConnectionId>>,

    /// Connection limits
    limits: Arc<ConnectionLimits>,

    /// Metrics
    total_connections: Arc<AtomicU64>,
    total_messages: Arc<AtomicU64>,
    dropped_messages: Arc<AtomicU64>,
}

impl ConnectionManager {
    /// Create a new `ConnectionManager`
    #[must_use]
    pub fn new(limits: ConnectionLimits) -> Self {
        let per_second = NonZeroU32::new(limits.max_messages_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            connections: Arc::new(DashMap::new()),
            active: Arc::new(AtomicUsize::new(0)),
            limiter: Arc::new(RateLimiter::keyed(Quota::per_second(per_second))),
            limits: Arc::new(limits),
            total_connections: Arc::new(AtomicU64::new(0)),
            total_messages: Arc::new(AtomicU64::new(0)),
            dropped_messages: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a new connection
    pub fn register(&self, connection_id: ConnectionId) -> Result<()> {
        let max_total = self.limits.max_total;
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max_total).then_some(n + 1))
            .map_err(|_| RelayError::ServerFull(max_total))?;

        if self
            .connections
            .insert(connection_id.clone(), ConnectionInfo::new(connection_id.clone()))
            .is_some()
        {
            // Re-registration keeps a single slot
            self.active.fetch_sub(1, Ordering::AcqRel);
        }
        self.total_connections.fetch_add(1, Ordering::Relaxed);

        info!(
            connection_id = %connection_id,
            total_connections = self.connections.len(),
            "Connection registered"
        );

        Ok(())
    }

    /// Record the room a connection authenticated into
    pub fn join_room(&self, connection_id: &ConnectionId, room_id: RoomId) {
        if let Some(mut conn) = self.connections.get_mut(connection_id) {
            conn.room_id = Some(room_id);
            conn.last_activity = Instant::now();

            debug!(
                connection_id = %connection_id,
                room_id = %room_id,
                "Connection joined room"
            );
        }
    }

    /// Mark a connection as alive without counting a message
    ///
    /// Called for protocol-level ping/pong frames, which are not rate limited.
    pub fn touch(&self, connection_id: &ConnectionId) {
        if let Some(mut conn) = self.connections.get_mut(connection_id) {
            conn.last_activity = Instant::now();
        }
    }

    /// Record an inbound message
    ///
    /// Returns `false` when the connection is over its message rate and the
    /// message should be dropped.
    pub fn record_message(&self, connection_id: &ConnectionId) -> bool {
        if let Some(mut conn) = self.connections.get_mut(connection_id) {
            conn.last_activity = Instant::now();
            conn.message_count += 1;
        }
        self.total_messages.fetch_add(1, Ordering::Relaxed);

        if self.limiter.check_key(connection_id).is_ok() {
            true
        } else {
            self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            warn!(connection_id = %connection_id, "Message rate exceeded, dropping message");
            false
        }
    }

    /// Unregister a connection
    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, conn_info)) = self.connections.remove(connection_id) {
            self.active.fetch_sub(1, Ordering::AcqRel);
            info!(
                connection_id = %connection_id,
                room_id = ?conn_info.room_id,
                duration = ?conn_info.duration(),
                message_count = conn_info.message_count,
                "Connection unregistered"
            );
        }
    }

    /// Check for idle connections
    ///
    /// Returns list of connection IDs that should be disconnected
    pub fn check_timeouts(&self) -> Vec<ConnectionId> {
        let mut to_disconnect = Vec::new();

        for entry in self.connections.iter() {
            let conn = entry.value();
            if conn.idle_duration() > self.limits.idle_timeout {
                warn!(
                    connection_id = %conn.connection_id,
                    idle_duration = ?conn.idle_duration(),
                    "Connection idle timeout"
                );
                to_disconnect.push(conn.connection_id.clone());
            }
        }

        // Forget rate state of connections that went quiet
        self.limiter.retain_recent();

        to_disconnect
    }

    /// Get connection count
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get metrics summary
    #[must_use]
    pub fn metrics(&self) -> ConnectionMetrics {
        ConnectionMetrics {
            active_connections: self.connection_count(),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            total_messages: self.total_messages.load(Ordering::Relaxed),
            dropped_messages: self.dropped_messages.load(Ordering::Relaxed),
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(ConnectionLimits::default())
    }
}

/// Connection metrics
#[derive(Debug, Clone)]
pub struct ConnectionMetrics {
    pub active_connections: usize,
    pub total_connections: u64,
    pub total_messages: u64,
    pub dropped_messages: u64,
}

//! Server lifecycle management
//!
//! Runs the HTTP/relay server and the maintenance sweep, and drains relay
//! connections on shutdown.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use pairwatch_api::AppState;
use pairwatch_core::Config;

/// Outcome of one maintenance pass
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Relay connections dropped for inactivity
    pub evicted: usize,
    /// Seats released
    pub pruned: usize,
}

/// Session lifetimes used by the sweep
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub idle_grace: chrono::Duration,
    pub max_age: chrono::Duration,
}

impl SessionLimits {
    fn from_config(config: &Config) -> Self {
        Self {
            idle_grace: seconds(config.auth.session_idle_grace_seconds),
            max_age: seconds(config.auth.room_token_ttl_seconds),
        }
    }
}

fn seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::from_std(Duration::from_secs(secs)).unwrap_or(chrono::Duration::MAX)
}

/// Evict idle relay connections and release abandoned seats
pub fn run_maintenance(state: &AppState, limits: SessionLimits) -> MaintenanceReport {
    let mut report = MaintenanceReport::default();

    for connection_id in state.connections.check_timeouts() {
        // Dropping the hub queue ends the connection task, which cleans up after itself
        if state.hub.leave(&connection_id).is_some() {
            report.evicted += 1;
        }
    }

    for session in state
        .rooms
        .prune_sessions(chrono::Utc::now(), limits.idle_grace, limits.max_age)
    {
        if session.connection.is_some() {
            state.hub.remove_session(session.room_id, &session.id);
        }
        report.pruned += 1;
    }

    report
}

/// `PairWatch` server
pub struct PairWatchServer {
    config: Config,
    state: AppState,
}

impl PairWatchServer {
    #[must_use]
    pub const fn new(config: Config, state: AppState) -> Self {
        Self { config, state }
    }

    /// Start all components and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        info!("Starting PairWatch server...");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = tokio::net::TcpListener::bind(self.config.http_address())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {e}", self.config.http_address()))?;
        info!("HTTP server listening on {}", listener.local_addr()?);

        let http_handle = self.start_http_server(listener, shutdown_rx.clone());
        let maintenance_handle = self.start_maintenance(shutdown_rx);

        tokio::select! {
            _ = http_handle => {
                error!("HTTP server stopped unexpectedly");
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        // Signal all components to shut down
        let _ = shutdown_tx.send(true);
        if let Err(e) = maintenance_handle.await {
            warn!("Maintenance task ended abnormally: {}", e);
        }

        self.shutdown().await;
        Ok(())
    }

    /// Close every relay connection and wait for them to drain
    async fn shutdown(&self) {
        info!("Shutting down PairWatch server...");

        self.state.hub.close_all();

        let drain_timeout = Duration::from_secs(self.config.server.drain_timeout_seconds);
        let drain_poll_interval = Duration::from_millis(100);
        let active = self.state.connections.connection_count();
        if active > 0 {
            info!(
                "Waiting up to {}s for {} active connection(s) to drain...",
                drain_timeout.as_secs(),
                active
            );
            let deadline = tokio::time::Instant::now() + drain_timeout;
            loop {
                let remaining = self.state.connections.connection_count();
                if remaining == 0 {
                    info!("All connections drained");
                    break;
                }
                if tokio::time::Instant::now() >= deadline {
                    warn!(
                        "Drain timeout reached with {} connection(s) still active, proceeding with shutdown",
                        remaining
                    );
                    break;
                }
                tokio::time::sleep(drain_poll_interval).await;
            }
        }

        let metrics = self.state.connections.metrics();
        info!(
            total_connections = metrics.total_connections,
            total_messages = metrics.total_messages,
            dropped_messages = metrics.dropped_messages,
            "PairWatch server shut down"
        );
    }

    /// Start HTTP server with graceful shutdown support
    fn start_http_server(
        &self,
        listener: tokio::net::TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let router = pairwatch_api::create_router(
            self.state.clone(),
            self.config.server.client_url.as_deref(),
        );

        tokio::spawn(async move {
            let mut rx = shutdown_rx;
            let graceful = async move {
                let _ = rx.changed().await;
            };

            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", e);
            }

            info!("HTTP server shut down gracefully");
        })
    }

    /// Periodic session pruning and idle eviction
    fn start_maintenance(&self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let state = self.state.clone();
        let limits = SessionLimits::from_config(&self.config);
        let period = Duration::from_secs(self.config.server.maintenance_interval_seconds.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = run_maintenance(&state, limits);
                        if report != MaintenanceReport::default() {
                            info!(evicted = report.evicted, pruned = report.pruned, "Maintenance sweep");
                        } else {
                            debug!("Maintenance sweep found nothing to do");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        })
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwatch_core::{
        bootstrap::init_services,
        config::{PasswordHashConfig, RoomSeed},
        models::{ConnectionId, RoomId},
    };

    async fn state() -> AppState {
        let mut config = Config::default();
        config.auth.site_password = "letmein".to_string();
        config.auth.password_hash = PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        };
        config.storage.public_url_prefix = Some("https://cdn.test/".to_string());
        config.rooms = vec![RoomSeed {
            name: "demo".to_string(),
            password: "password".to_string(),
            video_key: "sintel.mp4".to_string(),
        }];
        let services = init_services(&config).await.unwrap();
        AppState::new(services, &config)
    }

    #[tokio::test]
    async fn test_maintenance_releases_abandoned_seats() {
        let state = state().await;
        let seat = state.rooms.authenticate("demo", "password").await.unwrap();

        let limits = SessionLimits {
            idle_grace: chrono::Duration::seconds(-1),
            max_age: chrono::Duration::hours(1),
        };
        let report = run_maintenance(&state, limits);
        assert_eq!(report, MaintenanceReport { evicted: 0, pruned: 1 });
        assert!(state.rooms.leave(&seat.session.id).is_err());
    }

    #[tokio::test]
    async fn test_maintenance_drops_connection_of_expired_seat() {
        let state = state().await;
        let seat = state.rooms.authenticate("demo", "password").await.unwrap();
        let connection_id = ConnectionId::from("tab-1");
        state.rooms.attach(&seat.session.id, connection_id.clone()).unwrap();
        let mut joined = state
            .hub
            .join(RoomId(1), seat.session.id.clone(), connection_id)
            .unwrap();

        let limits = SessionLimits {
            idle_grace: chrono::Duration::hours(1),
            max_age: chrono::Duration::seconds(-1),
        };
        let report = run_maintenance(&state, limits);
        assert_eq!(report.pruned, 1);
        assert_eq!(state.hub.occupant_count(RoomId(1)), 0);
        assert!(joined.receiver.recv().await.is_none());
    }

    #[test]
    fn test_seconds_saturates() {
        assert_eq!(seconds(90), chrono::Duration::seconds(90));
        assert_eq!(seconds(u64::MAX), chrono::Duration::MAX);
    }
}

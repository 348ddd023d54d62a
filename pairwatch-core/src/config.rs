use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::ContentKind;

/// Largest number of viewers a room can ever hold
pub const MAX_ROOM_OCCUPANTS: usize = 2;

/// Upper bound for every configured lifetime (ten years)
pub const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 3600;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub relay: RelayConfig,
    pub catalog: CatalogConfig,
    pub rooms: Vec<RoomSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Allowed CORS origin; any origin when unset
    pub client_url: Option<String>,
    /// Interval of the session pruning / idle eviction sweep
    pub maintenance_interval_seconds: u64,
    /// How long shutdown waits for relay connections to drain
    pub drain_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 5000,
            client_url: None,
            maintenance_interval_seconds: 30,
            drain_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared password guarding the whole site
    pub site_password: String,
    /// HS256 signing secret; generated per process when empty
    pub jwt_secret: String,
    pub site_token_ttl_seconds: u64,
    pub room_token_ttl_seconds: u64,
    /// Detached sessions older than this lose their seat
    pub session_idle_grace_seconds: u64,
    pub password_hash: PasswordHashConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            site_password: String::new(),
            jwt_secret: String::new(),
            site_token_ttl_seconds: 86400,
            room_token_ttl_seconds: 6 * 3600,
            session_idle_grace_seconds: 600,
            password_hash: PasswordHashConfig::default(),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3 bucket; an in-process store is used when empty
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Serve objects from this prefix instead of presigning (CDN mode)
    pub public_url_prefix: Option<String>,
    pub video_url_ttl_seconds: u64,
    pub thumbnail_url_ttl_seconds: u64,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            public_url_prefix: None,
            video_url_ttl_seconds: 300,
            thumbnail_url_ttl_seconds: 3600,
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub max_per_room: usize,
    pub max_total: usize,
    pub auth_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_messages_per_second: u32,
    pub max_message_bytes: usize,
    pub outbound_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_per_room: MAX_ROOM_OCCUPANTS,
            max_total: 1000,
            auth_timeout_seconds: 10,
            idle_timeout_seconds: 300,
            max_messages_per_second: 20,
            max_message_bytes: 16 * 1024,
            outbound_buffer: 64,
        }
    }
}

/// Catalog override; the built-in sample list is used when `videos` is empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub videos: Vec<VideoSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSeed {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_key: String,
    #[serde(default)]
    pub thumbnail_key: Option<String>,
    pub kind: ContentKind,
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Room created at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSeed {
    pub name: String,
    pub password: String,
    pub video_key: String,
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // PAIRWATCH_AUTH__SITE_PASSWORD, PAIRWATCH_SERVER__HTTP_PORT, ...
        builder = builder.add_source(
            Environment::with_prefix("PAIRWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Collect every configuration problem instead of stopping at the first
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.auth.site_password.is_empty() {
            errors.push("auth.site_password must be set".to_string());
        }
        if self.server.http_port == 0 {
            errors.push("server.http_port must be non-zero".to_string());
        }
        if self.relay.max_per_room == 0 || self.relay.max_per_room > MAX_ROOM_OCCUPANTS {
            errors.push(format!(
                "relay.max_per_room must be between 1 and {MAX_ROOM_OCCUPANTS}"
            ));
        }
        if self.relay.max_messages_per_second == 0 {
            errors.push("relay.max_messages_per_second must be non-zero".to_string());
        }
        if self.storage.bucket.is_empty() && self.storage.public_url_prefix.is_none() {
            errors.push(
                "storage.bucket or storage.public_url_prefix must be set".to_string(),
            );
        }
        for (name, ttl) in [
            ("storage.video_url_ttl_seconds", self.storage.video_url_ttl_seconds),
            ("storage.thumbnail_url_ttl_seconds", self.storage.thumbnail_url_ttl_seconds),
            ("auth.site_token_ttl_seconds", self.auth.site_token_ttl_seconds),
            ("auth.room_token_ttl_seconds", self.auth.room_token_ttl_seconds),
            ("relay.idle_timeout_seconds", self.relay.idle_timeout_seconds),
        ] {
            if ttl == 0 {
                errors.push(format!("{name} must be non-zero"));
            } else if ttl > MAX_TTL_SECONDS {
                errors.push(format!("{name} must be at most {MAX_TTL_SECONDS}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.auth.site_password = "letmein".to_string();
        config.storage.bucket = "video-sync-bucket".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 5000);
        assert_eq!(config.relay.max_per_room, 2);
        assert_eq!(config.storage.video_url_ttl_seconds, 300);
        assert_eq!(config.storage.thumbnail_url_ttl_seconds, 3600);
        assert!(config.rooms.is_empty());
    }

    #[test]
    fn test_http_address() {
        let mut config = valid_config();
        config.server.host = "127.0.0.1".to_string();
        config.server.http_port = 8080;
        assert_eq!(config.http_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_validate_accepts_minimal_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = Config::default();
        config.relay.max_per_room = 3;
        config.storage.video_url_ttl_seconds = 0;

        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("site_password")));
        assert!(errors.iter().any(|e| e.contains("max_per_room")));
        assert!(errors.iter().any(|e| e.contains("storage.bucket")));
        assert!(errors.iter().any(|e| e.contains("video_url_ttl_seconds")));
    }

    #[test]
    fn test_validate_rejects_huge_ttl() {
        let mut config = valid_config();
        config.auth.room_token_ttl_seconds = u64::MAX;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("auth.room_token_ttl_seconds"));
    }

    #[test]
    fn test_public_prefix_satisfies_storage() {
        let mut config = valid_config();
        config.storage.bucket.clear();
        config.storage.public_url_prefix = Some("https://cdn.example.com/".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r"
server:
  http_port: 9090
auth:
  site_password: from-file
storage:
  bucket: movies
rooms:
  - name: friday
    password: popcorn
    videoKey: sintel.mp4
"
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.http_port, 9090);
        assert_eq!(config.auth.site_password, "from-file");
        assert_eq!(config.storage.bucket, "movies");
        assert_eq!(config.rooms.len(), 1);
        assert_eq!(config.rooms[0].video_key, "sintel.mp4");
        // Untouched sections keep their defaults
        assert_eq!(config.relay.max_per_room, 2);
    }
}

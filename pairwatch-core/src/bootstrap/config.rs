//! Configuration loading

use anyhow::{Context, Result};

use crate::{config::RoomSeed, Config};

/// Environment variable holding a JSON array of room seeds
pub const ROOM_CONFIGS_ENV: &str = "PAIRWATCH_ROOM_CONFIGS";

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. Explicit path (the `--config` flag)
/// 2. `PAIRWATCH_CONFIG_PATH` environment variable
/// 3. ./config.yaml (current working directory)
/// 4. Fall back to environment variables only
pub fn load_config(explicit_path: Option<&str>) -> Result<Config> {
    if let Some(path) = explicit_path {
        if !std::path::Path::new(path).exists() {
            anyhow::bail!("Config file {path} does not exist");
        }
    }

    let config_path = explicit_path
        .map(str::to_string)
        .or_else(|| {
            std::env::var("PAIRWATCH_CONFIG_PATH")
                .ok()
                .filter(|p| std::path::Path::new(p).exists())
        })
        .or_else(|| {
            let cwd = "config.yaml";
            std::path::Path::new(cwd).exists().then(|| cwd.to_string())
        });

    // Logging is not up yet, so report on stderr
    let mut config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path).with_context(|| format!("Failed to load {path}"))?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env().context("Failed to load config from environment")?
    };

    let room_configs = std::env::var(ROOM_CONFIGS_ENV).ok();
    apply_room_configs(&mut config, room_configs.as_deref())?;

    // Validate configuration (fail fast on misconfigurations)
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

/// Resolve the startup rooms
///
/// A JSON array in `PAIRWATCH_ROOM_CONFIGS` replaces the configured rooms.
/// With no rooms at all, a single `demo` room is created.
pub fn apply_room_configs(config: &mut Config, room_configs: Option<&str>) -> Result<()> {
    if let Some(raw) = room_configs.filter(|raw| !raw.trim().is_empty()) {
        config.rooms = serde_json::from_str::<Vec<RoomSeed>>(raw)
            .with_context(|| format!("{ROOM_CONFIGS_ENV} is not a valid JSON room list"))?;
    }

    if config.rooms.is_empty() {
        config.rooms.push(RoomSeed {
            name: "demo".to_string(),
            password: "password".to_string(),
            video_key: "sample.mp4".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_demo_room() {
        let mut config = Config::default();
        apply_room_configs(&mut config, None).unwrap();
        assert_eq!(config.rooms.len(), 1);
        assert_eq!(config.rooms[0].name, "demo");
        assert_eq!(config.rooms[0].password, "password");
        assert_eq!(config.rooms[0].video_key, "sample.mp4");
    }

    #[test]
    fn test_room_configs_replace_file_rooms() {
        let mut config = Config::default();
        config.rooms.push(RoomSeed {
            name: "from-file".to_string(),
            password: "x".to_string(),
            video_key: "x.mp4".to_string(),
        });

        apply_room_configs(
            &mut config,
            Some(r#"[{"name":"movie-night","password":"s3cret","videoKey":"sintel.mp4"}]"#),
        )
        .unwrap();

        assert_eq!(config.rooms.len(), 1);
        assert_eq!(config.rooms[0].name, "movie-night");
        assert_eq!(config.rooms[0].video_key, "sintel.mp4");
    }

    #[test]
    fn test_room_configs_invalid_json() {
        let mut config = Config::default();
        let err = apply_room_configs(&mut config, Some("{not json")).unwrap_err();
        assert!(err.to_string().contains(ROOM_CONFIGS_ENV));
    }

    #[test]
    fn test_missing_explicit_path() {
        assert!(load_config(Some("/definitely/not/here.yaml")).is_err());
    }
}

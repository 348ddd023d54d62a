//! Log subscriber setup
//!
//! `RUST_LOG` overrides everything. Otherwise the configured level applies to
//! the pairwatch crates and to request traces from `tower_http`, while the
//! transport and storage dependencies stay at `warn` unless the level is
//! `trace`.

use std::{fs::OpenOptions, sync::Arc};

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// Targets that follow the configured level
const SERVICE_TARGETS: &[&str] = &[
    "pairwatch",
    "pairwatch_core",
    "pairwatch_relay",
    "pairwatch_api",
    "tower_http",
];

/// Dependencies that flood `debug` with per-frame and per-request detail
const NOISY_TARGETS: &[&str] = &["hyper", "hyper_util", "h2", "tungstenite", "opendal", "reqwest"];

/// Install the global subscriber
///
/// `json` writes one flat object per event, so relay fields such as
/// `connection_id`, `room_id` and `session_id` are top-level keys. Anything
/// else gets the compact human format. Output goes to stdout, or is appended
/// to `file_path` without colors.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))?,
    };

    let (writer, ansi) = match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Arc::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let layer = if config.format.eq_ignore_ascii_case("json") {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    Ok(())
}

/// Filter directives used when `RUST_LOG` is unset
fn default_directives(level: Level) -> String {
    let name = level.as_str().to_ascii_lowercase();

    if level == Level::TRACE {
        return name;
    }
    let base = if level == Level::DEBUG { "info" } else { name.as_str() };

    let mut directives = vec![base.to_string()];
    directives.extend(SERVICE_TARGETS.iter().map(|target| format!("{target}={name}")));
    if base == "info" {
        directives.extend(NOISY_TARGETS.iter().map(|target| format!("{target}=warn")));
    }
    directives.join(",")
}

fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}

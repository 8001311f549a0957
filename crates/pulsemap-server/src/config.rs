//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tracker settings.
    #[serde(default)]
    pub tracker: TrackerSettings,

    /// Simulated feed settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Geo enrichment settings.
    #[serde(default)]
    pub geo: GeoConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the map frontend. Empty disables static serving.
    #[serde(default)]
    pub static_dir: String,
}

/// Origin tracker tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSettings {
    /// Inactivity window in milliseconds after which an origin expires.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Capacity of each observer's event queue.
    #[serde(default = "default_observer_queue")]
    pub observer_queue: usize,
}

/// Synthetic occurrence feed. Stands in for a real ingestion source so the
/// map is alive out of the box; disable it when wiring real ingestion to
/// `POST /api/observe`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Whether the feed runs at all.
    #[serde(default = "default_feed_enabled")]
    pub enabled: bool,

    /// Milliseconds between synthetic occurrences.
    #[serde(default = "default_feed_interval_ms")]
    pub interval_ms: u64,

    /// Pool of origins the feed samples from.
    #[serde(default = "default_feed_origins")]
    pub origins: Vec<String>,
}

/// Geo enrichment configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoConfig {
    /// Path to the JSON prefix dataset. Empty means the resolver never
    /// becomes ready and every origin gets placeholder attributes.
    #[serde(default)]
    pub dataset_path: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "pulsemap_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_cooldown_ms() -> u64 {
    30_000
}

fn default_observer_queue() -> usize {
    256
}

fn default_feed_enabled() -> bool {
    true
}

fn default_feed_interval_ms() -> u64 {
    2_000
}

fn default_feed_origins() -> Vec<String> {
    [
        "62.210.18.40",
        "210.48.22.134",
        "81.2.69.142",
        "186.33.216.1",
        "204.126.41.119",
        "144.22.238.11",
        "123.24.18.221",
        "99.122.159.34",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: String::new(),
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            observer_queue: default_observer_queue(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_feed_enabled(),
            interval_ms: default_feed_interval_ms(),
            origins: default_feed_origins(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PULSEMAP_HOST` overrides `server.host`
/// - `PULSEMAP_PORT` overrides `server.port`
/// - `PULSEMAP_STATIC_DIR` overrides `server.static_dir`
/// - `PULSEMAP_COOLDOWN_MS` overrides `tracker.cooldown_ms`
/// - `PULSEMAP_FEED_ENABLED` overrides `feed.enabled` ("true"/"1" to enable)
/// - `PULSEMAP_GEO_DATASET` overrides `geo.dataset_path`
/// - `PULSEMAP_LOG_LEVEL` overrides `logging.level`
/// - `PULSEMAP_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("PULSEMAP_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("PULSEMAP_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(static_dir) = std::env::var("PULSEMAP_STATIC_DIR") {
        config.server.static_dir = static_dir;
    }
    if let Ok(cooldown) = std::env::var("PULSEMAP_COOLDOWN_MS") {
        if let Ok(parsed) = cooldown.parse() {
            config.tracker.cooldown_ms = parsed;
        }
    }
    if let Ok(enabled) = std::env::var("PULSEMAP_FEED_ENABLED") {
        config.feed.enabled = enabled == "true" || enabled == "1";
    }
    if let Ok(dataset) = std::env::var("PULSEMAP_GEO_DATASET") {
        config.geo.dataset_path = dataset;
    }
    if let Ok(level) = std::env::var("PULSEMAP_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("PULSEMAP_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.tracker.cooldown_ms, 30_000);
        assert_eq!(config.tracker.observer_queue, 256);
        assert!(config.feed.enabled);
        assert_eq!(config.feed.interval_ms, 2_000);
        assert_eq!(config.feed.origins.len(), 8);
        assert!(config.geo.dataset_path.is_empty());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_keeps_section_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [tracker]
            cooldown_ms = 5000
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, default_host());
        assert_eq!(config.tracker.cooldown_ms, 5_000);
        assert_eq!(config.tracker.observer_queue, 256);
        assert!(config.feed.enabled);
    }

    #[test]
    fn feed_pool_is_configurable() {
        let config: Config = toml::from_str(
            r#"
            [feed]
            enabled = false
            interval_ms = 100
            origins = ["10.0.0.1", "10.0.0.2"]
            "#,
        )
        .unwrap();
        assert!(!config.feed.enabled);
        assert_eq!(config.feed.interval_ms, 100);
        assert_eq!(config.feed.origins, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/nonexistent/pulsemap.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("pulsemap-config-test-malformed.toml");
        std::fs::write(&path, "this is [not toml").unwrap();
        let result = load_config(path.to_str());
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `tidyhub.toml` in the working directory, or at the path in
//! `TIDYHUB_CONFIG`. Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use serde::Deserialize;
use tidyhub_adapter_virtual::HomeSpec;
use tidyhub_app::engine::EngineSettings;
use tidyhub_domain::room::{RoomConfig, validate_rooms};

const DEFAULT_PATH: &str = "tidyhub.toml";
const DEFAULT_FILTER: &str = "tidyhubd=info,tidyhub_app=info,tidyhub_adapter_virtual=info,tower_http=debug";
const DEBUG_FILTER: &str = "tidyhubd=debug,tidyhub_app=debug,tidyhub_adapter_virtual=debug,tower_http=debug";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Defaults shared by every room.
    pub cleaning: CleaningConfig,
    /// Configured rooms, in readout order.
    pub rooms: Vec<RoomConfig>,
    /// Virtual home to run against. The demo flat is used when absent.
    pub home: Option<HomeSpec>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Seconds a room stays on hold after occupancy clears.
    pub cooldown_secs: u64,
    /// Minimum seconds in a segment before it counts as cleaned.
    pub min_segment_secs: u64,
    /// Device attribute reporting the segment being cleaned.
    pub segment_attribute: String,
    /// Attach the would-be command to every device plan.
    pub debug: bool,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// rooms or cleaning defaults are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("TIDYHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.fill_demo();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TIDYHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("TIDYHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("TIDYHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("TIDYHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    /// Without a `[home]` section the demo flat is served, along with its
    /// three rooms when none are configured.
    fn fill_demo(&mut self) {
        if self.home.is_some() {
            return;
        }
        self.home = Some(HomeSpec::demo());
        if self.rooms.is_empty() {
            self.rooms = demo_rooms();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.settings()
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        validate_rooms(&self.rooms).map_err(|err| ConfigError::Validation(err.to_string()))?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Filter for the tracing subscriber. The debug flag raises the
    /// default filter, an explicit one is kept as is.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        if self.cleaning.debug && self.logging.filter == DEFAULT_FILTER {
            DEBUG_FILTER
        } else {
            &self.logging.filter
        }
    }

    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            cooldown_secs: self.cleaning.cooldown_secs,
            min_segment_secs: self.cleaning.min_segment_secs,
            segment_attribute: self.cleaning.segment_attribute.clone(),
            debug: self.cleaning.debug,
        }
    }

    /// The home to serve; empty before [`load`](Self::load) filled it in.
    #[must_use]
    pub fn home(&self) -> HomeSpec {
        self.home.clone().unwrap_or_default()
    }
}

/// Rooms matching the segments of [`HomeSpec::demo`].
#[must_use]
pub fn demo_rooms() -> Vec<RoomConfig> {
    vec![
        RoomConfig::new("kitchen", "vacuum.robot").with_segments([16]),
        RoomConfig::new("hallway", "vacuum.robot").with_segments([17]),
        RoomConfig::new("living_room", "vacuum.robot").with_segments([18]),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        let settings = EngineSettings::default();
        Self {
            cooldown_secs: settings.cooldown_secs,
            min_segment_secs: settings.min_segment_secs,
            segment_attribute: settings.segment_attribute,
            debug: settings.debug,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.cleaning.cooldown_secs, 0);
        assert_eq!(config.cleaning.min_segment_secs, 180);
        assert_eq!(config.cleaning.segment_attribute, "current_segment");
        assert!(!config.cleaning.debug);
        assert!(config.rooms.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.home.is_none());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [logging]
            filter = 'debug'

            [cleaning]
            cooldown_secs = 300
            min_segment_secs = 120
            segment_attribute = 'segment'
            debug = true

            [[rooms]]
            location = 'kitchen'
            device = 'vacuum.robot'
            segments = [16, 17]
            cooldown_secs = 60

            [[rooms]]
            location = 'hallway'
            device = 'vacuum.robot'
            segment_attribute = 'room_id'

            [[home.locations]]
            id = 'kitchen'
            name = 'Kitchen'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.cleaning.cooldown_secs, 300);
        assert_eq!(config.cleaning.segment_attribute, "segment");
        assert_eq!(
            config.rooms[0],
            RoomConfig::new("kitchen", "vacuum.robot")
                .with_segments([16, 17])
                .with_cooldown_secs(60)
        );
        assert!(config.rooms[1].segments.is_empty());
        assert_eq!(config.rooms[1].segment_attribute.as_deref(), Some("room_id"));
        assert_eq!(config.home().locations.len(), 1);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_blank_segment_attribute() {
        let mut config = Config::default();
        config.cleaning.segment_attribute = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_duplicate_rooms() {
        let mut config = Config::default();
        config.rooms = vec![
            RoomConfig::new("kitchen", "vacuum.robot").with_segments([1]),
            RoomConfig::new("kitchen", "vacuum.robot").with_segments([1]),
        ];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_room_without_device() {
        let toml = "
            [[rooms]]
            location = 'kitchen'
            device = ''
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_fill_demo_home_and_rooms_when_home_missing() {
        let mut config = Config::default();
        config.fill_demo();

        assert_eq!(config.home(), HomeSpec::demo());
        assert_eq!(config.rooms, demo_rooms());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_keep_configured_rooms_when_filling_demo_home() {
        let mut config = Config::default();
        config.rooms = vec![RoomConfig::new("kitchen", "vacuum.robot")];
        config.fill_demo();

        assert_eq!(config.rooms.len(), 1);
    }

    #[test]
    fn should_not_touch_configured_home() {
        let mut config: Config = toml::from_str("[home]").unwrap();
        config.fill_demo();

        assert_eq!(config.home(), HomeSpec::default());
        assert!(config.rooms.is_empty());
    }

    #[test]
    fn should_raise_default_filter_when_debug_enabled() {
        let mut config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_FILTER);

        config.cleaning.debug = true;
        assert_eq!(config.log_filter(), DEBUG_FILTER);

        config.logging.filter = "warn".to_string();
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}

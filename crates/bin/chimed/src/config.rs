//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `chime.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use chime_domain::reminder::ReminderSettings;
use chime_domain::weather::{WeatherSample, WeatherThresholds};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Rule engine settings.
    pub engine: EngineConfig,
    /// Simulated device settings.
    pub device: DeviceConfig,
    /// Health reminder settings.
    pub health: HealthConfig,
    /// Weather alert settings.
    pub weather: WeatherConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Rule engine configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest a single busy-guard hold may keep the host awake.
    pub busy_guard_ceiling_secs: u64,
}

/// Simulated battery and launcher.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Battery level at boot, in percent.
    pub battery_level: u8,
    /// Whether the charger is connected at boot.
    pub plugged: bool,
    /// Seconds between simulated battery ticks; `0` freezes the battery.
    pub tick_interval_secs: u64,
    /// Targets a `launch` action can open.
    pub installed_targets: Vec<String>,
}

/// Health reminders.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Start the reminders at boot.
    pub enabled: bool,
    #[serde(flatten)]
    pub reminders: ReminderSettings,
}

/// Weather alerts.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Run the periodic weather check.
    pub enabled: bool,
    /// Minutes between two checks.
    pub check_interval_minutes: u64,
    #[serde(flatten)]
    pub thresholds: WeatherThresholds,
    /// Conditions reported by the simulated weather source; none makes it unavailable.
    pub sample: Option<WeatherSample>,
}

impl Config {
    /// Load configuration from `chime.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("chime.toml")?;
        config.apply_env_overrides();
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
        if let Ok(val) = std::env::var("CHIME_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("CHIME_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("CHIME_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("CHIME_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("CHIME_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.busy_guard_ceiling_secs == 0 {
            return Err(ConfigError::Validation(
                "busy_guard_ceiling_secs must be non-zero".to_string(),
            ));
        }
        if self.device.battery_level > 100 {
            return Err(ConfigError::Validation(format!(
                "battery_level {} is above 100",
                self.device.battery_level
            )));
        }
        let health = &self.health.reminders;
        if health.work_start_hour >= health.work_end_hour || health.work_end_hour > 24 {
            return Err(ConfigError::Validation(format!(
                "work hours {}-{} are not a range within one day",
                health.work_start_hour, health.work_end_hour
            )));
        }
        for (name, schedule) in [
            ("sit", health.sit),
            ("water", health.water),
            ("eye", health.eye),
        ] {
            if schedule.enabled && schedule.interval_minutes == 0 {
                return Err(ConfigError::Validation(format!(
                    "{name} reminder interval must be non-zero"
                )));
            }
        }
        if self.weather.enabled && self.weather.check_interval_minutes == 0 {
            return Err(ConfigError::Validation(
                "weather check_interval_minutes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl EngineConfig {
    #[must_use]
    pub fn busy_guard_ceiling(&self) -> Duration {
        Duration::from_secs(self.busy_guard_ceiling_secs)
    }
}

impl DeviceConfig {
    /// Simulation tick period, `None` when the battery is frozen.
    #[must_use]
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_secs > 0).then(|| Duration::from_secs(self.tick_interval_secs))
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:chime.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "chimed=info,chime=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            busy_guard_ceiling_secs: 600,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            battery_level: 80,
            plugged: false,
            tick_interval_secs: 60,
            installed_targets: Vec::new(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminders: ReminderSettings::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_minutes: 60,
            thresholds: WeatherThresholds::default(),
            sample: Some(WeatherSample {
                description: "晴".to_string(),
                temperature_c: 22,
                aqi: Some(50),
            }),
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
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:chime.db?mode=rwc");
        assert_eq!(config.engine.busy_guard_ceiling(), Duration::from_secs(600));
        assert!(config.health.enabled);
        assert_eq!(config.health.reminders.sit.interval_minutes, 60);
        assert_eq!(config.weather.thresholds.heat_c, 35);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '0.0.0.0'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [engine]
            busy_guard_ceiling_secs = 120

            [device]
            battery_level = 35
            plugged = true
            tick_interval_secs = 0
            installed_targets = ['com.example.music']

            [health]
            enabled = false
            work_start_hour = 8
            work_end_hour = 20
            sit = { enabled = true, interval_minutes = 30 }

            [weather]
            check_interval_minutes = 15
            heat_c = 30
            sample = { description = '暴雨', temperature_c = 25, aqi = 180 }
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
        assert_eq!(config.database_url(), "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.engine.busy_guard_ceiling_secs, 120);
        assert_eq!(config.device.battery_level, 35);
        assert!(config.device.plugged);
        assert_eq!(config.device.tick_interval(), None);
        assert_eq!(config.device.installed_targets, vec!["com.example.music"]);
        assert!(!config.health.enabled);
        assert_eq!(config.health.reminders.work_start_hour, 8);
        assert_eq!(config.health.reminders.sit.interval_minutes, 30);
        assert_eq!(config.health.reminders.water.interval_minutes, 120);
        assert_eq!(config.weather.check_interval(), Duration::from_secs(900));
        assert_eq!(config.weather.thresholds.heat_c, 30);
        assert_eq!(config.weather.thresholds.aqi, 150);
        assert_eq!(config.weather.sample.unwrap().aqi, Some(180));
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
    fn should_reject_zero_busy_ceiling() {
        let mut config = Config::default();
        config.engine.busy_guard_ceiling_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_battery_above_100() {
        let mut config = Config::default();
        config.device.battery_level = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_inverted_work_hours() {
        let mut config = Config::default();
        config.health.reminders.work_start_hour = 18;
        config.health.reminders.work_end_hour = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_interval_for_enabled_reminder() {
        let mut config = Config::default();
        config.health.reminders.eye.interval_minutes = 0;
        assert!(config.validate().is_err());

        config.health.reminders.eye.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}

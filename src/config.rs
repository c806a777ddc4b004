//! # Server and Simulation Configuration
//!
//! Loaded from a TOML file; every field is optional.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! debug = true
//!
//! [simulation]
//! max_attempts_per_ip = 5
//! rate_limit_secs = 600
//! log_path = "logs/simulation_logs.json"
//! ```
//!
//! Environment variables (`PHISH_HOST`, `PHISH_PORT`, `PHISH_DEBUG`,
//! `PHISH_LOG_PATH`) override the file, and command line flags override both.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Listener and deployment-mode settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enables the admin log endpoints.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            log_level: default_log_level(),
        }
    }
}

/// Capture, rate-limit, and attempt-log settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_log_attempts")]
    pub log_attempts: bool,
    #[serde(default = "default_max_attempts_per_ip")]
    pub max_attempts_per_ip: usize,
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_max_tracked_addresses")]
    pub max_tracked_addresses: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            log_attempts: default_log_attempts(),
            max_attempts_per_ip: default_max_attempts_per_ip(),
            rate_limit_secs: default_rate_limit_secs(),
            log_path: default_log_path(),
            max_tracked_addresses: default_max_tracked_addresses(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SimulationConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Config {
    /// Applies `PHISH_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("PHISH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PHISH_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PHISH_PORT '{}'", port),
            }
        }
        if let Some(debug) = lookup("PHISH_DEBUG") {
            self.server.debug = debug.eq_ignore_ascii_case("true");
        }
        if let Some(path) = lookup("PHISH_LOG_PATH") {
            self.simulation.log_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.max_attempts_per_ip == 0 {
            return Err(ConfigError::Invalid("max_attempts_per_ip must be > 0".to_string()));
        }
        if sim.rate_limit_secs == 0 {
            return Err(ConfigError::Invalid("rate_limit_secs must be > 0".to_string()));
        }
        if sim.max_tracked_addresses == 0 {
            return Err(ConfigError::Invalid("max_tracked_addresses must be > 0".to_string()));
        }
        if sim.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep_interval_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_attempts() -> bool { true }
fn default_max_attempts_per_ip() -> usize { 10 }
fn default_rate_limit_secs() -> u64 { 60 * 60 }
fn default_log_path() -> PathBuf { PathBuf::from("simulation_logs.json") }
fn default_max_tracked_addresses() -> usize { 10_000 }
fn default_sweep_interval_secs() -> u64 { 5 * 60 }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(!config.server.debug);
        assert!(config.simulation.log_attempts);
        assert_eq!(config.simulation.max_attempts_per_ip, 10);
        assert_eq!(config.simulation.rate_limit_window(), Duration::from_secs(3600));
        assert_eq!(config.simulation.log_path, PathBuf::from("simulation_logs.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("phish.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[server]\nport = 8080\ndebug = true\n[simulation]\nmax_attempts_per_ip = 3").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.debug);
        assert_eq!(config.simulation.max_attempts_per_ip, 3);
        // Defaults for missing fields
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.simulation.rate_limit_secs, 3600);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("PHISH_HOST", "127.0.0.1"),
            ("PHISH_PORT", "9000"),
            ("PHISH_DEBUG", "TRUE"),
            ("PHISH_LOG_PATH", "/tmp/attempts.json"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert!(config.server.debug);
        assert_eq!(config.simulation.log_path, PathBuf::from("/tmp/attempts.json"));
    }

    #[test]
    fn test_invalid_env_port_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "PHISH_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.simulation.max_attempts_per_ip = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.simulation.rate_limit_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}

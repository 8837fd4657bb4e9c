//! Configuration management
//!
//! Loads an optional JSON configuration file, then applies environment
//! overrides (`FIX_MOCK_HOST`, `FIX_MOCK_PORT`, also read from `.env`).
//! Every field has a default, so an empty file or no file at all is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::fix::tags::{FIELD_DELIMITER, MESSAGE_TERMINATOR};
use crate::fix::Symbol;
use crate::session::market::DEFAULT_SYMBOLS;
use crate::session::EmissionSchedule;

pub const HOST_ENV: &str = "FIX_MOCK_HOST";
pub const PORT_ENV: &str = "FIX_MOCK_PORT";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// File (or defaults), then `.env` and process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply host/port overrides from `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            self.server.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigurationError::InvalidPort(port.clone()))?;
        }
        Ok(())
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigurationError::InvalidAddress {
                addr: self.server.listen_addr(),
                reason: "host is empty".to_string(),
            });
        }

        check_identifier("session.sender_comp_id", &self.session.sender_comp_id)?;
        check_identifier("session.target_comp_id", &self.session.target_comp_id)?;
        check_non_zero("session.heart_bt_int", u64::from(self.session.heart_bt_int))?;

        check_non_zero("schedule.tick_interval_ms", self.schedule.tick_interval_ms)?;
        check_non_zero("schedule.order_every", u64::from(self.schedule.order_every))?;
        check_non_zero(
            "schedule.execution_every",
            u64::from(self.schedule.execution_every),
        )?;
        if self.schedule.symbols.is_empty() {
            return Err(ConfigurationError::ZeroValue {
                field: "schedule.symbols",
            });
        }
        for symbol in &self.schedule.symbols {
            check_identifier("schedule.symbols", symbol)?;
        }

        Ok(())
    }
}

fn check_non_zero(field: &'static str, value: u64) -> Result<(), ConfigurationError> {
    if value == 0 {
        return Err(ConfigurationError::ZeroValue { field });
    }
    Ok(())
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ConfigurationError> {
    if value.is_empty()
        || value
            .bytes()
            .any(|b| b == FIELD_DELIMITER || b == MESSAGE_TERMINATOR)
    {
        return Err(ConfigurationError::InvalidIdentifier {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// 0 lets the OS pick a port
    pub port: u16,
    /// How long shutdown waits for sessions before aborting them
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9878,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Identity the server presents in every header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub sender_comp_id: String,
    pub target_comp_id: String,
    /// HeartBtInt sent in the Logon, in seconds
    pub heart_bt_int: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            sender_comp_id: "TARGET".to_string(),
            target_comp_id: "SENDER".to_string(),
            heart_bt_int: 30,
        }
    }
}

/// Emission cadence and synthetic instruments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub tick_interval_ms: u64,
    pub tick_count: u32,
    pub order_every: u32,
    pub execution_every: u32,
    pub symbols: Vec<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        let schedule = EmissionSchedule::default();
        ScheduleConfig {
            tick_interval_ms: schedule.tick_interval.as_millis() as u64,
            tick_count: schedule.tick_count,
            order_every: schedule.order_every,
            execution_every: schedule.execution_every,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScheduleConfig {
    pub fn emission_schedule(&self) -> EmissionSchedule {
        EmissionSchedule {
            tick_count: self.tick_count,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            order_every: self.order_every,
            execution_every: self.execution_every,
        }
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.symbols.iter().map(Symbol::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr(), "127.0.0.1:9878");
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.session.sender_comp_id, "TARGET");
        assert_eq!(config.session.target_comp_id, "SENDER");
        assert_eq!(config.session.heart_bt_int, 30);
        assert_eq!(config.schedule.emission_schedule(), EmissionSchedule::default());
        assert_eq!(config.schedule.symbols().len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "server": { "port": 10001 }, "schedule": { "tick_count": 6 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 10001);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.schedule.tick_count, 6);
        assert_eq!(config.schedule.tick_interval_ms, 5_000);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("fix_mock_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "session": { "sender_comp_id": "MOCK" } }"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.session.sender_comp_id, "MOCK");
    }

    #[test]
    fn test_from_missing_file_fails() {
        assert!(Config::from_file("/nonexistent/fix-mock.json").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(HOST_ENV, "0.0.0.0"), (PORT_ENV, "9999")].into();
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.listen_addr(), "0.0.0.0:9999");
    }

    #[test]
    fn test_bad_env_port() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == PORT_ENV).then(|| "99999".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPort(_)));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.server.host = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidAddress { .. })
        ));

        let mut config = Config::default();
        config.schedule.tick_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::ZeroValue {
                field: "schedule.tick_interval_ms"
            })
        ));

        let mut config = Config::default();
        config.session.target_comp_id = "A|B".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidIdentifier { .. })
        ));

        let mut config = Config::default();
        config.schedule.symbols.clear();
        assert!(config.validate().is_err());
    }
}

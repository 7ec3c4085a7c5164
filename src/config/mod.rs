// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data output directory
    pub data_dir: PathBuf,

    /// Enable debug diagnostics
    pub debug: bool,

    /// Serial device configuration
    pub device: DeviceConfig,

    /// Message broker configuration
    pub broker: BrokerConfig,

    /// Per-category monitoring flags
    pub monitoring: MonitoringConfig,

    /// Event log configuration
    pub logging: LoggingConfig,

    /// Command socket configuration
    pub command: CommandConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            debug: false,
            device: DeviceConfig::default(),
            broker: BrokerConfig::default(),
            monitoring: MonitoringConfig::default(),
            logging: LoggingConfig::default(),
            command: CommandConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("rayshed"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Serial device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device path
    pub path: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Blocking read timeout in seconds
    pub read_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_timeout_secs: 60,
        }
    }
}

/// Message broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker host
    pub host: String,

    /// Broker port
    pub port: u16,

    /// Broker username
    pub username: Option<String>,

    /// Broker password
    pub password: Option<String>,

    /// Client identifier
    pub client_id: String,

    /// Topic events are published to
    pub topic: String,

    /// Enable event publication at startup
    pub enabled: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            client_id: "rayshed".to_string(),
            topic: "rayshed/events".to_string(),
            enabled: true,
        }
    }
}

/// Per-category monitoring flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Monitor vibration events
    pub vibration: bool,

    /// Monitor weather events
    pub weather: bool,

    /// Monitor cosmic ray events
    pub cosmics: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            vibration: true,
            weather: true,
            cosmics: true,
        }
    }
}

/// Event log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable the local event log at startup
    pub enabled: bool,

    /// Event log path
    pub event_log: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_log: PathBuf::from("./data/events.log"),
        }
    }
}

/// Command socket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Unix socket path the command server listens on
    pub socket: PathBuf,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/tmp/rayshed.sock"),
        }
    }
}

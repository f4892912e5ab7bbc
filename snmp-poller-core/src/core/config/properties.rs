use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use derive_more::Display;
use log::{debug, trace};
use serde::Deserialize;

use crate::core::config::{CollectorConfig, ConfigError, Result};

const DEFAULT_INTERVAL_MILLIS: fn() -> u64 = || 5000;
const DEFAULT_PROGRAM: fn() -> String = || "snmpget".to_string();
const DEFAULT_TIMEOUT_MILLIS: fn() -> u64 = || 10_000;

/// The properties of the poller as read from its YAML configuration file.
///
/// ```yaml
/// interval: 3000
/// snmpget:
///   args: ["-v2c", "-c", "public"]
/// hosts:
///   consul-c1:
///     sysName.0:
///     dskPercent.1:
///       min: 30
/// ```
#[derive(Debug, Display, Clone, Deserialize, PartialEq)]
#[display("interval: {}ms, hosts: {}", interval, hosts.len())]
pub struct PollerProperties {
    /// The interval between polling rounds in millis.
    #[serde(default = "DEFAULT_INTERVAL_MILLIS")]
    interval: u64,
    #[serde(default)]
    snmpget: CommandProperties,
    #[serde(default)]
    hosts: CollectorConfig,
}

impl PollerProperties {
    /// Load the properties from the given YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        trace!("Reading poller properties from {:?}", path);
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;

        let properties = Self::from_str(contents.as_str())?;
        debug!("Loaded poller properties {} from {:?}", properties, path);
        Ok(properties)
    }

    /// Returns the interval between polling rounds.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    /// Returns the settings of the `snmpget` command transport.
    pub fn snmpget(&self) -> &CommandProperties {
        &self.snmpget
    }

    /// Returns the hosts and metrics to poll.
    pub fn hosts(&self) -> &CollectorConfig {
        &self.hosts
    }

    fn validate(self) -> Result<Self> {
        if self.interval == 0 {
            return Err(ConfigError::InvalidValue(
                self.interval.to_string(),
                "interval".to_string(),
            ));
        }
        if self.snmpget.timeout == 0 {
            return Err(ConfigError::InvalidValue(
                self.snmpget.timeout.to_string(),
                "snmpget.timeout".to_string(),
            ));
        }
        if self.snmpget.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                format!("\"{}\"", self.snmpget.program),
                "snmpget.program".to_string(),
            ));
        }

        Ok(self)
    }
}

impl Default for PollerProperties {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MILLIS(),
            snmpget: Default::default(),
            hosts: Default::default(),
        }
    }
}

impl FromStr for PollerProperties {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self> {
        // an empty document is a valid, empty, configuration
        if value.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str::<PollerProperties>(value)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .and_then(|e| e.validate())
    }
}

/// The settings of the external `snmpget` command.
#[derive(Debug, Display, Clone, Deserialize, PartialEq)]
#[display("{} {:?}", program, args)]
pub struct CommandProperties {
    #[serde(default = "DEFAULT_PROGRAM")]
    program: String,
    /// Additional arguments passed before the host, e.g. the protocol version and community.
    #[serde(default)]
    args: Vec<String>,
    /// The max time a single query may take in millis.
    #[serde(default = "DEFAULT_TIMEOUT_MILLIS")]
    timeout: u64,
}

impl CommandProperties {
    pub fn program(&self) -> &str {
        self.program.as_str()
    }

    pub fn args(&self) -> &[String] {
        self.args.as_slice()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

impl Default for CommandProperties {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM(),
            args: vec![],
            timeout: DEFAULT_TIMEOUT_MILLIS(),
        }
    }
}

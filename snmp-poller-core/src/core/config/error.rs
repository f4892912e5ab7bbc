use thiserror::Error;

/// The result type of configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The errors which can occur while loading the poller configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {0}, {1}")]
    Io(String, String),
    /// The configuration contents are not valid YAML for the poller.
    #[error("failed to parse configuration, {0}")]
    Parse(String),
    /// A configuration field has an unsupported value.
    #[error("invalid value {0} given for {1}")]
    InvalidValue(String, String),
}

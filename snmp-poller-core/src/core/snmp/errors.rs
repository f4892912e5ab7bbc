use std::time::Duration;

use thiserror::Error;

/// The result type of SNMP operations.
pub type Result<T> = std::result::Result<T, SnmpError>;

/// The errors which can occur while querying a host for a metric.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnmpError {
    /// The transport was unable to start the query.
    #[error("failed to execute query, {0}")]
    Io(String),
    /// The query completed, but the transport reported a failure.
    #[error("query failed, {0}")]
    Transport(String),
    /// The query didn't complete within the allowed time.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    /// The query response contained a value which couldn't be parsed.
    #[error("failed to parse value, {0}")]
    Parse(String),
}

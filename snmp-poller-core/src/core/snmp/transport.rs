use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use log::{debug, trace};
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use tokio::process::Command;
use tokio::time;

use crate::core::config::{CommandProperties, MetricKey};
use crate::core::snmp::{Result, SnmpError};

const DEFAULT_PROGRAM: &str = "snmpget";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The transport which executes a single metric query against a host.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait SnmpTransport: Send + Sync {
    /// Query the given host for the value of the metric key.
    ///
    /// # Returns
    ///
    /// It returns the raw, unparsed, response of the host.
    async fn query(&self, host: &str, key: &MetricKey) -> Result<String>;
}

/// A transport which queries hosts through the net-snmp `snmpget` command line tool.
/// The local net-snmp installation is expected to be configured for the polled hosts,
/// additional arguments such as the protocol version can be passed through [CommandTransportBuilder::arg].
#[derive(Debug, Display, Clone)]
#[display("{} {:?}", program, args)]
pub struct CommandTransport {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTransport {
    pub fn builder() -> CommandTransportBuilder {
        CommandTransportBuilder::default()
    }

    fn command(&self, host: &str, key: &MetricKey) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(host)
            .arg(key.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for CommandTransport {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&CommandProperties> for CommandTransport {
    fn from(value: &CommandProperties) -> Self {
        Self::builder()
            .program(value.program())
            .args(value.args().iter().cloned())
            .timeout(value.timeout())
            .build()
    }
}

#[async_trait]
impl SnmpTransport for CommandTransport {
    async fn query(&self, host: &str, key: &MetricKey) -> Result<String> {
        let mut command = self.command(host, key);
        trace!("Executing {:?}", command);
        let output = time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SnmpError::Timeout(self.timeout))?
            .map_err(|e| SnmpError::Io(format!("{}, {}", self.program, e)))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            debug!("Received {} response {:?}", self.program, stdout);
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SnmpError::Transport(format!(
                "{} {}, {}",
                self.program,
                output.status,
                stderr.trim()
            )))
        }
    }
}

/// Builder for the [CommandTransport].
#[derive(Debug, Default)]
pub struct CommandTransportBuilder {
    program: Option<String>,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandTransportBuilder {
    /// Set the program to execute, defaults to `snmpget`.
    pub fn program<S: Into<String>>(mut self, program: S) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Add an argument which is passed to the program before the host and metric key.
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add the arguments which are passed to the program before the host and metric key.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the max duration of a single query.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> CommandTransport {
        CommandTransport {
            program: self.program.unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            args: self.args,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use derive_more::Display;
use log::{debug, error, info, LevelFilter};
use snmp_poller_core::core::config::{CollectorConfig, ConfigError, PollerProperties};
use snmp_poller_core::core::snmp::{CommandTransport, SnmpTransport};
use snmp_poller_core::core::{Collector, Snapshot};
use thiserror::Error;
use tokio::select;

/// The errors which stop the poller application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration, {0}")]
    Config(#[from] ConfigError),
    #[error("failed to initialize logger, {0}")]
    Logger(#[from] snmp_poller_logging::Error),
    #[error("failed to write snapshot, {0}")]
    Output(String),
    #[error("failed to listen for the interrupt signal, {0}")]
    Signal(String),
}

#[derive(Debug, Clone, Display, Parser)]
#[command(name = "snmp-poller", version, about)]
#[display("config: {:?}, interval: {:?}, duration: {:?}", config, interval, duration)]
pub struct PollerArgs {
    /// The YAML file with the hosts and metrics to poll.
    #[arg(long, short)]
    pub config: PathBuf,
    /// The interval between polling rounds in millis, overrides the interval of the config file.
    #[arg(long)]
    pub interval: Option<u64>,
    /// Stop polling after the given amount of millis.
    /// When omitted, the poller keeps running until it's interrupted.
    #[arg(long)]
    pub duration: Option<u64>,
    /// The root log level.
    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
    /// A log4rs config file to use instead of the default logger configuration.
    #[arg(long)]
    pub log_config: Option<PathBuf>,
    /// Additionally write the log output to the given rolling file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// Disable the default `log4rs` logger.
    #[arg(long, default_value_t = false)]
    pub disable_logger: bool,
}

/// Runs a single collector from the command line arguments.
#[derive(Debug)]
pub struct PollerApp {
    args: PollerArgs,
}

impl PollerApp {
    pub fn new(args: PollerArgs) -> Self {
        Self { args }
    }

    /// Poll the configured hosts until the duration elapsed or the process is interrupted.
    ///
    /// It returns the last snapshot of the collector.
    pub async fn run(self) -> Result<Snapshot, AppError> {
        debug!("Running poller with {}", self.args);
        let properties = PollerProperties::from_file(&self.args.config)?;
        let interval = match self.args.interval {
            Some(0) => {
                return Err(ConfigError::InvalidValue("0".to_string(), "--interval".to_string()).into())
            }
            Some(millis) => Duration::from_millis(millis),
            None => properties.interval(),
        };
        let transport = CommandTransport::from(properties.snmpget());
        info!("Querying hosts through {}", transport);

        collect(
            properties.hosts().clone(),
            interval,
            Arc::new(transport),
            self.args.duration.map(Duration::from_millis),
            tokio::signal::ctrl_c(),
        )
        .await
    }
}

/// Run a collector until the duration elapsed or the interrupt completes.
///
/// When the interrupt fails while a duration is given, the collector keeps running until the
/// duration elapsed. Without a duration, the interrupt failure is returned.
async fn collect<F>(
    config: CollectorConfig,
    interval: Duration,
    transport: Arc<dyn SnmpTransport>,
    duration: Option<Duration>,
    interrupt: F,
) -> Result<Snapshot, AppError>
where
    F: Future<Output = io::Result<()>>,
{
    let collector = Collector::new(config, interval, transport);

    match duration {
        Some(duration) => select! {
            _ = tokio::time::sleep(duration) => debug!("Poll duration of {:?} has elapsed", duration),
            _ = interrupted(interrupt) => {},
        },
        None => {
            interrupt.await.map_err(|e| {
                error!("Unable to listen for the interrupt signal, {}", e);
                AppError::Signal(e.to_string())
            })?;
            info!("Received interrupt signal");
        }
    }

    collector.stop();
    Ok(collector.snapshot())
}

/// Wait for the interrupt to complete.
/// A failing interrupt never completes.
async fn interrupted<F>(interrupt: F)
where
    F: Future<Output = io::Result<()>>,
{
    match interrupt.await {
        Ok(_) => info!("Received interrupt signal"),
        Err(e) => {
            error!("Unable to listen for the interrupt signal, {}", e);
            std::future::pending::<()>().await
        }
    }
}

use clap::Parser;
use log::info;
use snmp_poller_logging::PollerLogger;

use crate::app::{AppError, PollerApp, PollerArgs};

mod app;

/// The main entry of the SNMP poller.
///
/// It polls the configured hosts until the requested duration has elapsed, or the process is
/// interrupted, after which the latest snapshot is written as JSON to stdout.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = PollerArgs::parse();
    let _logger = if args.disable_logger {
        None
    } else {
        Some(init_logger(&args)?)
    };

    info!("Starting SNMP poller {}", snmp_poller_core::VERSION);
    let snapshot = PollerApp::new(args).run().await?;
    let output =
        serde_json::to_string_pretty(&snapshot).map_err(|e| AppError::Output(e.to_string()))?;
    println!("{}", output);
    Ok(())
}

fn init_logger(args: &PollerArgs) -> Result<PollerLogger, AppError> {
    let mut builder = PollerLogger::builder();
    builder.root_level(args.log_level);
    if let Some(path) = args.log_config.as_ref() {
        builder.config_path(path);
    }
    if let Some(path) = args.log_file.as_ref() {
        builder.log_path(path);
    }

    Ok(builder.build()?)
}

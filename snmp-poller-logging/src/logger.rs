use crate::{Error, Result};
use log::{info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{Config, Handle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const LOG_FORMAT_CONSOLE: &str = "\x1B[37m{d(%Y-%m-%d %H:%M:%S%.3f)}\x1B[0m {h({l:>5.5})} \x1B[37m---\x1B[0m \x1B[37m[{T:>15.15}]\x1B[0m \x1B[36m{t:<40.40}\x1B[0m \x1B[37m:\x1B[0m {m}{n}";
const LOG_FORMAT_FILE: &str =
    "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:>5.5} --- [{T:>15.15}] {t:<40.40} : {m}{n}";
const CONSOLE_APPENDER: &str = "stderr";
const FILE_APPENDER: &str = "file";
const LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;
const LOG_FILE_WINDOW: u32 = 3;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Routes the poller's log output to stderr, and optionally to a size based rolling file.
///
/// The JSON snapshot owns stdout, so the console appender never writes to it.
/// A single logger can be active per process, a failed initialization can be retried.
#[derive(Debug)]
pub struct PollerLogger {
    handle: Handle,
}

impl PollerLogger {
    /// Returns a builder instance for the logger.
    pub fn builder() -> PollerLoggerBuilder {
        PollerLoggerBuilder::default()
    }

    fn new(
        root_level: LevelFilter,
        config_path: Option<PathBuf>,
        log_path: Option<PathBuf>,
        loggers: Vec<(String, LevelFilter)>,
    ) -> Result<Self> {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        match Self::init(root_level, config_path, log_path, loggers) {
            Ok(handle) => {
                info!("SNMP poller logger has been initialized");
                Ok(Self { handle })
            }
            Err(e) => {
                INITIALIZED.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn init(
        root_level: LevelFilter,
        config_path: Option<PathBuf>,
        log_path: Option<PathBuf>,
        loggers: Vec<(String, LevelFilter)>,
    ) -> Result<Handle> {
        let config = match config_path {
            Some(path) => Self::load_from_config(path)?,
            None => Self::create_config(root_level, log_path, loggers)?,
        };

        log4rs::init_config(config).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Returns the most verbose level the poller currently logs, including per target overrides.
    pub fn root_log_level(&self) -> LevelFilter {
        self.handle.max_log_level()
    }

    fn load_from_config(path: impl AsRef<Path>) -> Result<Config> {
        log4rs::config::load_config_file(path, Default::default())
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn create_config(
        root_level: LevelFilter,
        log_path: Option<PathBuf>,
        loggers: Vec<(String, LevelFilter)>,
    ) -> Result<Config> {
        // the snapshot is written to stdout, keep the log output away from it
        let mut root = Root::builder().appender(CONSOLE_APPENDER);
        let mut config_builder = Config::builder().appender(
            Appender::builder().build(
                CONSOLE_APPENDER,
                Box::new(
                    ConsoleAppender::builder()
                        .target(log4rs::append::console::Target::Stderr)
                        .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_CONSOLE)))
                        .build(),
                ),
            ),
        );

        if let Some(path) = log_path {
            config_builder = config_builder.appender(Self::create_file_appender(path)?);
            root = root.appender(FILE_APPENDER);
        }

        for (target, level) in loggers {
            config_builder = config_builder.logger(Logger::builder().build(target, level));
        }

        config_builder
            .build(root.build(root_level))
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn create_file_appender(path: PathBuf) -> Result<Appender> {
        if let Some(parent) = path.parent().filter(|e| !e.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let roller_pattern = format!("{}.{{}}", path.display());
        let roller = FixedWindowRoller::builder()
            .base(1)
            .build(roller_pattern.as_str(), LOG_FILE_WINDOW)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let policy = CompoundPolicy::new(
            Box::new(SizeTrigger::new(LOG_FILE_SIZE)),
            Box::new(roller),
        );

        Ok(Appender::builder().build(
            FILE_APPENDER,
            Box::new(
                RollingFileAppender::builder()
                    .encoder(Box::new(PatternEncoder::new(LOG_FORMAT_FILE)))
                    .append(true)
                    .build(path, Box::new(policy))
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?,
            ),
        ))
    }
}

/// Builder for the [PollerLogger].
#[derive(Debug, Default)]
pub struct PollerLoggerBuilder {
    root_level: Option<LevelFilter>,
    config_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    loggers: HashMap<String, LevelFilter>,
}

impl PollerLoggerBuilder {
    /// Set the level of all poller output without a target override, defaults to `info`.
    pub fn root_level(&mut self, level: LevelFilter) -> &mut Self {
        self.root_level = Some(level);
        self
    }

    /// Use the given log4rs config file instead of the stderr/rolling file setup.
    /// When set, the level, log file and target overrides of the builder are ignored.
    pub fn config_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Additionally write the output to the given file, which is rolled over every 10 MiB.
    /// Missing parent directories are created.
    pub fn log_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the level of a log target, such as `snmp_poller_core::core::snmp`.
    pub fn logger<S: AsRef<str>>(&mut self, target: S, level: LevelFilter) -> &mut Self {
        self.loggers.insert(target.as_ref().to_string(), level);
        self
    }

    /// Install the poller logger for this process.
    ///
    /// It returns [Error::AlreadyInitialized] when a poller logger is already active, or
    /// [Error::InvalidConfig] when the log4rs configuration could not be loaded.
    pub fn build(&mut self) -> Result<PollerLogger> {
        let root_level = self.root_level.take().unwrap_or(LevelFilter::Info);
        let config_path = self.config_path.take();
        let log_path = self.log_path.take();
        let loggers = self.loggers.drain().collect::<Vec<_>>();

        PollerLogger::new(root_level, config_path, log_path, loggers)
    }
}

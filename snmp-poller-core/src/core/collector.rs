use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use log::{debug, info, trace, warn};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::config::CollectorConfig;
use crate::core::snmp::{CommandTransport, FetchOutcome, MetricFetcher, MetricValue, SnmpTransport};
use crate::core::{CollectorState, Scheduler, Snapshot, SnapshotStore};

const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// Periodically polls the configured hosts for their metrics and keeps the latest values in memory.
///
/// The first polling round is triggered when the collector is created, after which a new round
/// is triggered every interval until [Collector::stop] is called.
/// Each round starts one query per (host, metric) pair without waiting on any of them to complete.
///
/// # Example
///
/// ```no_run
/// use snmp_poller_core::core::Collector;
/// use snmp_poller_core::core::config::{CollectorConfig, HostConfig};
/// use std::time::Duration;
///
/// # async fn run() {
/// let collector = Collector::builder()
///     .config(CollectorConfig::new().with_host("consul-c1", HostConfig::new().with_metric("sysName.0", None)))
///     .interval(Duration::from_secs(3))
///     .build();
///
/// let snapshot = collector.snapshot();
/// collector.stop();
/// # }
/// ```
#[derive(Debug, Display)]
#[display("Collector of {} hosts every {:?}", inner.config.len(), scheduler.interval())]
pub struct Collector {
    inner: Arc<InnerCollector>,
    scheduler: Scheduler,
}

impl Collector {
    /// Create a new collector which polls the given config through the transport every interval.
    ///
    /// # Panics
    ///
    /// Panics when not called from within a tokio runtime.
    pub fn new(
        config: CollectorConfig,
        interval: Duration,
        transport: Arc<dyn SnmpTransport>,
    ) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                "Collector interval cannot be zero, using {:?} instead",
                DEFAULT_INTERVAL
            );
            DEFAULT_INTERVAL
        } else {
            interval
        };
        let store = SnapshotStore::new();
        let (outcome_sender, outcome_receiver) = unbounded_channel();
        tokio::spawn(Self::apply_outcomes(store.clone(), outcome_receiver));

        let inner = Arc::new(InnerCollector {
            config,
            fetcher: MetricFetcher::new(transport),
            store,
            outcome_sender,
            rounds: Default::default(),
        });

        inner.poll_once();
        let scheduler_inner = inner.clone();
        let scheduler = Scheduler::start(interval, move || scheduler_inner.poll_once());
        info!(
            "Collector started polling {} metrics of {} hosts every {:?}",
            inner.config.metric_count(),
            inner.config.len(),
            interval
        );

        Self { inner, scheduler }
    }

    /// Returns a builder instance for the collector.
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::default()
    }

    /// Trigger an additional polling round, next to the scheduled ones.
    /// This doesn't wait for any of the fetches to complete.
    ///
    /// A stopped collector ignores the trigger.
    pub fn poll_once(&self) {
        if self.scheduler.state() == CollectorState::Stopped {
            debug!("Collector has been stopped, ignoring polling round trigger");
            return;
        }

        self.inner.poll_once();
    }

    /// Returns a copy of the latest known metric values.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.store.read()
    }

    /// Returns the latest known value of the given host metric.
    pub fn value(&self, host: &str, key: &str) -> Option<MetricValue> {
        self.inner.store.value(host, key)
    }

    /// Returns the hosts and metrics which are being polled.
    pub fn config(&self) -> &CollectorConfig {
        &self.inner.config
    }

    /// Returns the interval between polling rounds.
    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    /// Returns the number of polling rounds which have been triggered.
    pub fn rounds(&self) -> u64 {
        self.inner.rounds.load(Ordering::Relaxed)
    }

    /// Returns the current state of the collector.
    pub fn state(&self) -> CollectorState {
        self.scheduler.state()
    }

    /// Stop triggering new polling rounds.
    /// Fetches which are still in flight will complete and update the snapshot.
    /// The latest snapshot remains readable after the collector has been stopped.
    pub fn stop(&self) {
        if self.scheduler.state() == CollectorState::Running {
            self.scheduler.stop();
            info!("Collector has been stopped after {} rounds", self.rounds());
        }
    }

    async fn apply_outcomes(store: SnapshotStore, mut receiver: UnboundedReceiver<FetchOutcome>) {
        while let Some(outcome) = receiver.recv().await {
            trace!("Applying fetch outcome {}", outcome);
            store.apply(outcome);
        }
        trace!("Collector outcome channel has been closed");
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for the [Collector].
#[derive(Default)]
pub struct CollectorBuilder {
    config: Option<CollectorConfig>,
    interval: Option<Duration>,
    transport: Option<Arc<dyn SnmpTransport>>,
}

impl CollectorBuilder {
    /// Set the hosts and metrics to poll.
    pub fn config(mut self, config: CollectorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the interval between polling rounds, defaults to 5 seconds.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the transport used to query the hosts, defaults to the `snmpget` command.
    pub fn transport(mut self, transport: Arc<dyn SnmpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Create the collector and trigger its first polling round.
    ///
    /// # Panics
    ///
    /// Panics when not called from within a tokio runtime.
    pub fn build(self) -> Collector {
        Collector::new(
            self.config.unwrap_or_default(),
            self.interval.unwrap_or(DEFAULT_INTERVAL),
            self.transport
                .unwrap_or_else(|| Arc::new(CommandTransport::default())),
        )
    }
}

#[derive(Debug)]
struct InnerCollector {
    config: CollectorConfig,
    fetcher: MetricFetcher,
    store: SnapshotStore,
    outcome_sender: UnboundedSender<FetchOutcome>,
    rounds: AtomicU64,
}

impl InnerCollector {
    fn poll_once(&self) {
        let round = self.rounds.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Starting polling round {} of {} metrics",
            round,
            self.config.metric_count()
        );

        for (host, host_config) in self.config.hosts() {
            for key in host_config.keys() {
                let fetcher = self.fetcher.clone();
                let sender = self.outcome_sender.clone();
                let host = host.to_string();
                let key = key.clone();

                tokio::spawn(async move {
                    let outcome = fetcher.fetch(host, key).await;
                    if let Err(e) = sender.send(outcome) {
                        debug!("Unable to store fetch outcome {}, store is gone", e.0);
                    }
                });
            }
        }
    }
}

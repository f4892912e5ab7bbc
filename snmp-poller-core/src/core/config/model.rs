use std::borrow::Borrow;
use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The identifier of a metric on a host, e.g. the object name `sysName.0`.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricKey(String);

impl MetricKey {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for MetricKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MetricKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for MetricKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for MetricKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

/// Advisory bounds of a metric.
/// The poller only carries these values, they're never enforced.
#[derive(Debug, Display, Default, Clone, PartialEq, Serialize, Deserialize)]
#[display("min: {:?}, max: {:?}", min, max)]
pub struct MetricBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// The metrics which should be polled from a single host.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostConfig {
    metrics: BTreeMap<MetricKey, Option<MetricBounds>>,
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the given metric to the host, replacing any existing bounds hint.
    pub fn with_metric<K: Into<MetricKey>>(mut self, key: K, bounds: Option<MetricBounds>) -> Self {
        self.metrics.insert(key.into(), bounds);
        self
    }

    /// Returns the metric keys of this host.
    pub fn keys(&self) -> impl Iterator<Item = &MetricKey> {
        self.metrics.keys()
    }

    /// Returns the bounds hint of the given metric key, if any.
    pub fn bounds(&self, key: &str) -> Option<&MetricBounds> {
        self.metrics.get(key).and_then(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// The static set of hosts and their metrics which are being polled by a collector.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectorConfig {
    hosts: BTreeMap<String, HostConfig>,
}

impl CollectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the given host to the config, replacing any existing host with the same name.
    pub fn with_host<S: Into<String>>(mut self, host: S, config: HostConfig) -> Self {
        self.hosts.insert(host.into(), config);
        self
    }

    /// Returns the configured hosts together with their metrics.
    pub fn hosts(&self) -> impl Iterator<Item = (&str, &HostConfig)> {
        self.hosts.iter().map(|(host, config)| (host.as_str(), config))
    }

    /// Returns the config of the given host, if known.
    pub fn host(&self, host: &str) -> Option<&HostConfig> {
        self.hosts.get(host)
    }

    /// Returns the total number of (host, metric) pairs which are queried in one round.
    pub fn metric_count(&self) -> usize {
        self.hosts.values().map(|e| e.len()).sum()
    }

    /// Returns the number of configured hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_bounds() {
        let config = HostConfig::new()
            .with_metric("sysName.0", None)
            .with_metric(
                "dskPercent.1",
                Some(MetricBounds {
                    min: Some(30.0),
                    max: None,
                }),
            );

        assert_eq!(None, config.bounds("sysName.0"));
        assert_eq!(Some(30.0), config.bounds("dskPercent.1").and_then(|e| e.min));
        assert_eq!(None, config.bounds("dskAvail.1"));
        assert_eq!(
            vec!["dskPercent.1", "sysName.0"],
            config.keys().map(|e| e.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_collector_config_metric_count() {
        let config = CollectorConfig::new()
            .with_host(
                "consul-c1",
                HostConfig::new()
                    .with_metric("sysName.0", None)
                    .with_metric("dskAvail.1", None),
            )
            .with_host("consul-c2", HostConfig::new().with_metric("sysName.0", None))
            .with_host("consul-c3", HostConfig::new());

        assert_eq!(3, config.len());
        assert_eq!(3, config.metric_count());
        assert_eq!(false, config.is_empty());
        assert!(config.host("consul-c3").is_some());
        assert!(config.host("consul-c4").is_none());
    }

    #[test]
    fn test_metric_key_display() {
        let key = MetricKey::from("sysName.0");

        assert_eq!("sysName.0", key.to_string());
    }
}

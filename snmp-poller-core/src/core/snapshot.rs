use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::trace;

use crate::core::config::MetricKey;
use crate::core::snmp::{FetchOutcome, MetricValue};

/// The latest known value of each metric, per host.
pub type Snapshot = BTreeMap<String, BTreeMap<MetricKey, MetricValue>>;

/// The in-memory store of the latest fetched metric values.
///
/// A host, or metric key, only becomes present after its first successful fetch.
/// Values are never expired, they're only replaced by a newer successful fetch of the same metric.
#[derive(Debug, Default, Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the given fetch outcome to the store.
    /// Only outcomes which carry a value update the store, all others are ignored.
    ///
    /// # Returns
    ///
    /// It returns `true` when the value of the metric has been stored.
    pub fn apply(&self, outcome: FetchOutcome) -> bool {
        let value = match outcome.result {
            Ok(Some(value)) => value,
            _ => return false,
        };

        trace!("Updating {}[{}] to {}", outcome.host, outcome.key, value);
        self.write()
            .entry(outcome.host)
            .or_default()
            .insert(outcome.key, value);
        true
    }

    /// Returns a copy of the current snapshot.
    pub fn read(&self) -> Snapshot {
        self.lock().clone()
    }

    /// Returns the latest known value of the given host metric.
    pub fn value(&self, host: &str, key: &str) -> Option<MetricValue> {
        self.lock()
            .get(host)
            .and_then(|metrics| metrics.get(key))
            .cloned()
    }

    /// Returns `true` when no value has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> RwLockReadGuard<'_, Snapshot> {
        // a poisoned lock still holds a consistent snapshot as each write is a single insert
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snmp::SnmpError;

    fn outcome(host: &str, key: &str, result: Result<Option<MetricValue>, SnmpError>) -> FetchOutcome {
        FetchOutcome {
            host: host.to_string(),
            key: MetricKey::from(key),
            result,
        }
    }

    #[test]
    fn test_apply_value() {
        let store = SnapshotStore::new();

        let result = store.apply(outcome("h1", "sysName.0", Ok(Some(MetricValue::from("h1")))));

        assert_eq!(true, result);
        assert_eq!(Some(MetricValue::from("h1")), store.value("h1", "sysName.0"));
    }

    #[test]
    fn test_apply_absent_value() {
        let store = SnapshotStore::new();
        store.apply(outcome("h1", "dskPercent.1", Ok(Some(MetricValue::from(27i64)))));

        let result = store.apply(outcome("h1", "dskPercent.1", Ok(None)));

        assert_eq!(false, result);
        assert_eq!(
            Some(MetricValue::from(27i64)),
            store.value("h1", "dskPercent.1"),
            "expected the previous value to have been retained"
        );
    }

    #[test]
    fn test_apply_error() {
        let store = SnapshotStore::new();

        let result = store.apply(outcome(
            "h1",
            "sysName.0",
            Err(SnmpError::Transport("Timeout: No Response from h1".to_string())),
        ));

        assert_eq!(false, result);
        assert!(store.is_empty(), "expected no host entry to have been created");
        assert_eq!(Snapshot::new(), store.read());
    }

    #[test]
    fn test_apply_is_commutative() {
        let first = SnapshotStore::new();
        let second = SnapshotStore::new();

        first.apply(outcome("h1", "k1", Ok(Some(MetricValue::from(1i64)))));
        first.apply(outcome("h2", "k1", Ok(Some(MetricValue::from(2i64)))));
        second.apply(outcome("h2", "k1", Ok(Some(MetricValue::from(2i64)))));
        second.apply(outcome("h1", "k1", Ok(Some(MetricValue::from(1i64)))));

        assert_eq!(first.read(), second.read());
    }

    #[test]
    fn test_apply_last_write_wins() {
        let store = SnapshotStore::new();

        store.apply(outcome("h1", "k1", Ok(Some(MetricValue::from(5i64)))));
        store.apply(outcome("h1", "k1", Ok(Some(MetricValue::from(7i64)))));

        assert_eq!(Some(MetricValue::from(7i64)), store.value("h1", "k1"));
    }

    #[test]
    fn test_apply_keeps_other_cells() {
        let store = SnapshotStore::new();
        store.apply(outcome("h1", "k1", Ok(Some(MetricValue::from("lorem")))));
        store.apply(outcome("h1", "k2", Ok(Some(MetricValue::from("ipsum")))));

        store.apply(outcome("h1", "k1", Ok(Some(MetricValue::from("dolor")))));

        let result = store.read();
        assert_eq!(1, result.len());
        assert_eq!(Some(&MetricValue::from("dolor")), result["h1"].get("k1"));
        assert_eq!(Some(&MetricValue::from("ipsum")), result["h1"].get("k2"));
    }

    #[test]
    fn test_read_is_a_copy() {
        let store = SnapshotStore::new();
        store.apply(outcome("h1", "k1", Ok(Some(MetricValue::from(1i64)))));

        let snapshot = store.read();
        store.apply(outcome("h1", "k1", Ok(Some(MetricValue::from(2i64)))));

        assert_eq!(Some(&MetricValue::from(1i64)), snapshot["h1"].get("k1"));
    }

    #[test]
    fn test_concurrent_apply() {
        let store = SnapshotStore::new();
        let handles = (0..8)
            .map(|host| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for key in 0..50i64 {
                        store.apply(outcome(
                            format!("h{}", host).as_str(),
                            format!("k{}", key).as_str(),
                            Ok(Some(MetricValue::from(key))),
                        ));
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let result = store.read();
        assert_eq!(8, result.len());
        assert!(result.values().all(|metrics| metrics.len() == 50));
    }
}

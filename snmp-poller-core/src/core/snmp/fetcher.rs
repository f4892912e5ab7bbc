use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use derive_more::Display;
use log::{debug, error, trace};

use crate::core::config::MetricKey;
use crate::core::snmp::{parse_value, MetricValue, Result, SnmpTransport};

/// The outcome of fetching a single metric from a host.
#[derive(Debug, Display, Clone, PartialEq)]
#[display("{}[{}]", host, key)]
pub struct FetchOutcome {
    pub host: String,
    pub key: MetricKey,
    /// The fetched value, `None` when the response held no usable value.
    pub result: Result<Option<MetricValue>>,
}

impl FetchOutcome {
    /// Returns the fetched value of this outcome, if any.
    pub fn value(&self) -> Option<&MetricValue> {
        self.result.as_ref().ok().and_then(|e| e.as_ref())
    }
}

/// Fetches metrics from hosts through the underlying [SnmpTransport].
#[derive(Clone)]
pub struct MetricFetcher {
    transport: Arc<dyn SnmpTransport>,
}

impl MetricFetcher {
    pub fn new(transport: Arc<dyn SnmpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch the value of the given metric key from the host.
    /// Failures are reported through the outcome and never retried.
    pub async fn fetch(&self, host: String, key: MetricKey) -> FetchOutcome {
        trace!("Fetching {} from {}", key, host);
        let result = match self.transport.query(host.as_str(), &key).await {
            Ok(response) => match parse_value(response.as_str()) {
                Ok(value) => Ok(value),
                Err(e) => {
                    debug!("Ignoring {} value of {}, {}", key, host, e);
                    Ok(None)
                }
            },
            Err(e) => {
                error!("Failed to fetch {} from {}, {}", key, host, e);
                Err(e)
            }
        };

        FetchOutcome { host, key, result }
    }
}

impl Debug for MetricFetcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricFetcher").finish()
    }
}

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use super::DataStorageConfiguration;
use super::DiscoverySpi;
use crate::constants::DEFAULT_FAILURE_DETECTION_TIMEOUT_MS;
use crate::Error;
use crate::ProductVersion;
use crate::Result;

/// Metric exporter SPI enabled on a node
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricExporter {
    Jmx,
    Log,
    OpenCensus,
}

impl MetricExporter {
    pub fn class_name(&self) -> &'static str {
        match self {
            MetricExporter::Jmx => "org.apache.ignite.spi.metric.jmx.JmxMetricExporterSpi",
            MetricExporter::Log => "org.apache.ignite.spi.metric.log.LogExporterSpi",
            MetricExporter::OpenCensus => {
                "org.apache.ignite.spi.metric.opencensus.OpenCensusMetricExporterSpi"
            }
        }
    }
}

/// Configuration of one node (server or client) of the cluster under test.
///
/// Immutable: derive variants, e.g. a client configuration from a server
/// one, with the `with_*` methods.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NodeConfiguration {
    #[serde(default)]
    version: ProductVersion,

    #[serde(default)]
    client_mode: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    consistent_id: Option<String>,

    #[serde(default)]
    peer_class_loading_enabled: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    metric_exporters: BTreeSet<MetricExporter>,

    /// Failure detection timeout in milliseconds
    #[serde(default = "default_failure_detection_timeout")]
    failure_detection_timeout: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    discovery_spi: Option<DiscoverySpi>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_storage: Option<DataStorageConfiguration>,
}

impl Default for NodeConfiguration {
    fn default() -> Self {
        Self::new(ProductVersion::default())
    }
}

impl NodeConfiguration {
    pub fn new(version: ProductVersion) -> Self {
        Self {
            version,
            client_mode: false,
            consistent_id: None,
            peer_class_loading_enabled: false,
            metric_exporters: BTreeSet::new(),
            failure_detection_timeout: default_failure_detection_timeout(),
            discovery_spi: None,
            data_storage: None,
        }
    }

    pub fn version(&self) -> ProductVersion {
        self.version
    }

    pub fn client_mode(&self) -> bool {
        self.client_mode
    }

    pub fn consistent_id(&self) -> Option<&str> {
        self.consistent_id.as_deref()
    }

    pub fn peer_class_loading_enabled(&self) -> bool {
        self.peer_class_loading_enabled
    }

    pub fn metric_exporters(&self) -> &BTreeSet<MetricExporter> {
        &self.metric_exporters
    }

    pub fn failure_detection_timeout(&self) -> u64 {
        self.failure_detection_timeout
    }

    pub fn discovery_spi(&self) -> Option<&DiscoverySpi> {
        self.discovery_spi.as_ref()
    }

    pub fn data_storage(&self) -> Option<&DataStorageConfiguration> {
        self.data_storage.as_ref()
    }

    pub fn with_version(
        self,
        version: ProductVersion,
    ) -> Self {
        Self { version, ..self }
    }

    pub fn with_client_mode(
        self,
        client_mode: bool,
    ) -> Self {
        Self {
            client_mode,
            ..self
        }
    }

    pub fn with_consistent_id(
        self,
        consistent_id: impl Into<String>,
    ) -> Self {
        Self {
            consistent_id: Some(consistent_id.into()),
            ..self
        }
    }

    pub fn with_peer_class_loading_enabled(
        self,
        enabled: bool,
    ) -> Self {
        Self {
            peer_class_loading_enabled: enabled,
            ..self
        }
    }

    pub fn with_metric_exporters(
        self,
        exporters: impl IntoIterator<Item = MetricExporter>,
    ) -> Self {
        Self {
            metric_exporters: exporters.into_iter().collect(),
            ..self
        }
    }

    pub fn with_failure_detection_timeout(
        self,
        timeout_ms: u64,
    ) -> Self {
        Self {
            failure_detection_timeout: timeout_ms,
            ..self
        }
    }

    pub fn with_discovery_spi(
        self,
        discovery_spi: DiscoverySpi,
    ) -> Self {
        Self {
            discovery_spi: Some(discovery_spi),
            ..self
        }
    }

    pub fn with_data_storage(
        self,
        data_storage: DataStorageConfiguration,
    ) -> Self {
        Self {
            data_storage: Some(data_storage),
            ..self
        }
    }

    /// Validates the node configuration and the schemas nested in it
    pub fn validate(&self) -> Result<()> {
        if self.failure_detection_timeout == 0 {
            return Err(Error::InvalidConfig(
                "failure_detection_timeout must be > 0".into(),
            ));
        }
        if let Some(id) = &self.consistent_id {
            if id.trim().is_empty() {
                return Err(Error::InvalidConfig("consistent_id cannot be empty".into()));
            }
        }
        if let Some(discovery) = &self.discovery_spi {
            discovery.validate()?;
        }
        if let Some(storage) = &self.data_storage {
            storage.validate()?;
        }
        Ok(())
    }
}

fn default_failure_detection_timeout() -> u64 {
    DEFAULT_FAILURE_DETECTION_TIMEOUT_MS
}

use serde::Deserialize;
use serde::Serialize;

use crate::ClusterService;
use crate::Error;
use crate::Result;

/// Discovery settings: which addresses a joining node probes to find the
/// cluster, and which local port range it listens on.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct DiscoverySpi {
    /// Static IP finder addresses (`host:port`)
    #[serde(default)]
    addresses: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_port_range: Option<u16>,
}

impl DiscoverySpi {
    pub fn new(addresses: Vec<String>) -> Self {
        Self {
            addresses,
            ..Default::default()
        }
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    pub fn local_port_range(&self) -> Option<u16> {
        self.local_port_range
    }

    pub fn with_local_port(
        self,
        port: u16,
    ) -> Self {
        Self {
            local_port: Some(port),
            ..self
        }
    }

    pub fn with_local_port_range(
        self,
        range: u16,
    ) -> Self {
        Self {
            local_port_range: Some(range),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.addresses.iter().find(|a| !a.contains(':')) {
            return Err(Error::InvalidConfig(format!(
                "discovery address '{bad}' must be host:port"
            )));
        }
        if self.local_port == Some(0) {
            return Err(Error::InvalidConfig("discovery local_port cannot be 0".into()));
        }
        Ok(())
    }
}

/// Discovery pointed at every running member of `cluster`
pub fn from_cluster<C>(cluster: &C) -> DiscoverySpi
where
    C: ClusterService + ?Sized,
{
    DiscoverySpi::new(cluster.discovery_addresses())
}

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::ClusterState;
use crate::Result;
use crate::ServiceError;

/// In-process address registry standing in for the network discovery probes.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct LocalNetwork {
    endpoints: Arc<RwLock<HashMap<String, Arc<ClusterState>>>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(
        &self,
        address: &str,
    ) -> bool {
        self.endpoints.read().contains_key(address)
    }

    /// Binds every address to `state`, or none of them if one is taken
    pub(crate) fn bind_all(
        &self,
        addresses: &[String],
        state: &Arc<ClusterState>,
    ) -> Result<()> {
        let mut endpoints = self.endpoints.write();
        if let Some(taken) = addresses.iter().find(|a| endpoints.contains_key(a.as_str())) {
            return Err(ServiceError::StartupFailed {
                service: state.name().to_string(),
                reason: format!("address {taken} already in use"),
            }
            .into());
        }
        for address in addresses {
            endpoints.insert(address.clone(), state.clone());
        }
        Ok(())
    }

    pub(crate) fn unbind_all(
        &self,
        addresses: &[String],
    ) {
        let mut endpoints = self.endpoints.write();
        for address in addresses {
            endpoints.remove(address);
        }
    }

    /// First cluster reachable through `addresses`
    pub(crate) fn resolve(
        &self,
        addresses: &[String],
    ) -> Option<Arc<ClusterState>> {
        let endpoints = self.endpoints.read();
        addresses.iter().find_map(|a| endpoints.get(a).cloned())
    }
}

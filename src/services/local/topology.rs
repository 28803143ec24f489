use std::collections::BTreeMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::NodeConfiguration;
use crate::Result;
use crate::ServiceError;
use crate::TopologySnapshot;

/// One live member of a local cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub consistent_id: String,
    /// Discovery address; client members do not listen
    pub address: Option<String>,
    pub client: bool,
}

#[derive(Debug, Default)]
struct Topology {
    version: u64,
    nodes: BTreeMap<String, ClusterNode>,
}

impl Topology {
    fn snapshot(&self) -> TopologySnapshot {
        let clients = self.nodes.values().filter(|n| n.client).count();
        TopologySnapshot {
            version: self.version,
            servers: self.nodes.len() - clients,
            clients,
        }
    }
}

/// Shared membership of one local cluster
pub(crate) struct ClusterState {
    name: String,
    config: NodeConfiguration,
    topology: Mutex<Topology>,
    changes: watch::Sender<TopologySnapshot>,
    next_server: AtomicUsize,
}

impl ClusterState {
    pub(crate) fn new(
        name: &str,
        config: NodeConfiguration,
    ) -> Arc<Self> {
        let (changes, _) = watch::channel(TopologySnapshot::default());
        Arc::new(Self {
            name: name.to_string(),
            config,
            topology: Mutex::new(Topology::default()),
            changes,
            next_server: AtomicUsize::new(0),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> &NodeConfiguration {
        &self.config
    }

    /// Adds `node` and returns the new topology version
    pub(crate) fn join(
        &self,
        node: ClusterNode,
    ) -> Result<u64> {
        let mut topology = self.topology.lock();
        if topology.nodes.contains_key(&node.consistent_id) {
            return Err(ServiceError::StartupFailed {
                service: self.name.clone(),
                reason: format!("node {} is already in topology", node.consistent_id),
            }
            .into());
        }

        topology.version += 1;
        debug!(
            "[{}] node {} joined (client={}), topology version {}",
            self.name, node.consistent_id, node.client, topology.version
        );
        topology.nodes.insert(node.consistent_id.clone(), node);
        self.changes.send_replace(topology.snapshot());

        Ok(topology.version)
    }

    /// Removes the node and returns the new topology version, `None` if it
    /// was not a member
    pub(crate) fn leave(
        &self,
        consistent_id: &str,
    ) -> Option<u64> {
        let mut topology = self.topology.lock();
        topology.nodes.remove(consistent_id)?;

        topology.version += 1;
        debug!(
            "[{}] node {} left, topology version {}",
            self.name, consistent_id, topology.version
        );
        self.changes.send_replace(topology.snapshot());

        Some(topology.version)
    }

    pub(crate) fn snapshot(&self) -> TopologySnapshot {
        self.topology.lock().snapshot()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<TopologySnapshot> {
        self.changes.subscribe()
    }

    /// Picks the next server node other than `local_id`, round robin
    pub(crate) fn next_remote_server(
        &self,
        local_id: &str,
    ) -> Option<ClusterNode> {
        let topology = self.topology.lock();
        let remotes: Vec<&ClusterNode> = topology
            .nodes
            .values()
            .filter(|n| !n.client && n.consistent_id != local_id)
            .collect();

        if remotes.is_empty() {
            return None;
        }

        let idx = self.next_server.fetch_add(1, Ordering::Relaxed) % remotes.len();
        Some(remotes[idx].clone())
    }
}

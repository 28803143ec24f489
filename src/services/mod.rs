//! Lifecycle collaborators the scenarios drive.
//!
//! The harness never manages processes itself: it starts a cluster, starts a
//! client application, and observes topology through these traits. Retry
//! and process supervision belong to the implementations.
mod local;
pub use local::*;

#[cfg(test)]
use mockall::automock;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::NodeConfiguration;
use crate::Result;

/// Membership as seen by the discovery layer.
///
/// `version` is bumped on every join and every leave, so it only equals the
/// member count while members have only joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub version: u64,
    pub servers: usize,
    pub clients: usize,
}

impl TopologySnapshot {
    pub fn members(&self) -> usize {
        self.servers + self.clients
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterService: Send + Sync {
    /// Starts `num_nodes` server members with `config`.
    ///
    /// Returns once every member is live, or fails with a startup error.
    async fn start(
        &self,
        config: NodeConfiguration,
        num_nodes: usize,
    ) -> Result<()>;

    /// Configuration the running members were started with
    fn config(&self) -> Option<NodeConfiguration>;

    /// Discovery addresses of the running members
    fn discovery_addresses(&self) -> Vec<String>;

    /// Current topology as reported by discovery
    async fn topology(&self) -> Result<TopologySnapshot>;

    /// Topology version observed by the scenarios
    async fn topology_version(&self) -> Result<u64> {
        Ok(self.topology().await?.version)
    }

    /// Stops every member
    async fn stop(&self) -> Result<()>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApplicationService: Send + Sync {
    /// Starts the application registered under `entry_point` and returns
    /// without waiting for it
    async fn start_async(
        &self,
        config: NodeConfiguration,
        entry_point: String,
        params: serde_json::Value,
    ) -> Result<()>;

    /// Waits until the application process exits; fails if it exited abnormally
    async fn await_stopped(&self) -> Result<()>;
}

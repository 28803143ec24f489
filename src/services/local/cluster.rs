use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use nanoid::nanoid;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::ClusterNode;
use super::ClusterState;
use super::LocalNetwork;
use crate::constants::DEFAULT_DISCOVERY_PORT;
use crate::write_rendered;
use crate::ClusterService;
use crate::ConfigRenderer;
use crate::NodeConfiguration;
use crate::Result;
use crate::ServiceError;
use crate::SpringXmlRenderer;
use crate::TopologySnapshot;

struct Running {
    state: Arc<ClusterState>,
    shutdown: CancellationToken,
    members: Vec<JoinHandle<()>>,
    addresses: Vec<String>,
}

/// Cluster whose members are tasks of the current runtime.
///
/// Each member joins the topology `join_delay` after `start` and stays until
/// `stop`.
pub struct LocalCluster {
    name: String,
    network: LocalNetwork,
    host: String,
    base_port: u16,
    join_delay: Duration,
    render_dir: Option<PathBuf>,
    renderer: Arc<dyn ConfigRenderer>,
    running: Mutex<Option<Running>>,
}

impl LocalCluster {
    pub fn new(
        name: impl Into<String>,
        network: LocalNetwork,
    ) -> Self {
        Self {
            name: name.into(),
            network,
            host: "127.0.0.1".to_string(),
            base_port: DEFAULT_DISCOVERY_PORT,
            join_delay: Duration::ZERO,
            render_dir: None,
            renderer: Arc::new(SpringXmlRenderer),
            running: Mutex::new(None),
        }
    }

    pub fn with_base_port(
        mut self,
        base_port: u16,
    ) -> Self {
        self.base_port = base_port;
        self
    }

    /// Delay between `start` and a member joining the topology
    pub fn with_join_delay(
        mut self,
        join_delay: Duration,
    ) -> Self {
        self.join_delay = join_delay;
        self
    }

    /// Writes every member's rendered configuration into `dir` on start
    pub fn with_render_dir(
        mut self,
        dir: impl Into<PathBuf>,
        renderer: Arc<dyn ConfigRenderer>,
    ) -> Self {
        self.render_dir = Some(dir.into());
        self.renderer = renderer;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn startup_failed(
        &self,
        reason: impl Into<String>,
    ) -> ServiceError {
        ServiceError::StartupFailed {
            service: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn member_address(
        &self,
        idx: usize,
    ) -> Result<String> {
        let port = u16::try_from(idx)
            .ok()
            .and_then(|i| self.base_port.checked_add(i))
            .ok_or_else(|| self.startup_failed(format!("no discovery port left for member {idx}")))?;
        Ok(format!("{}:{}", self.host, port))
    }

    async fn render_members(
        &self,
        config: &NodeConfiguration,
        members: &[ClusterNode],
    ) -> Result<()> {
        let Some(dir) = &self.render_dir else {
            return Ok(());
        };
        for member in members {
            let member_config = config.clone().with_consistent_id(member.consistent_id.clone());
            write_rendered(self.renderer.as_ref(), &member_config, dir, &member.consistent_id).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterService for LocalCluster {
    async fn start(
        &self,
        config: NodeConfiguration,
        num_nodes: usize,
    ) -> Result<()> {
        if self.running.lock().is_some() {
            return Err(ServiceError::AlreadyStarted(self.name.clone()).into());
        }
        if num_nodes == 0 {
            return Err(self.startup_failed("at least one member is required").into());
        }
        if config.client_mode() {
            return Err(self.startup_failed("server members cannot run in client mode").into());
        }
        config.validate()?;

        let mut members = Vec::with_capacity(num_nodes);
        for idx in 0..num_nodes {
            let consistent_id = match config.consistent_id() {
                Some(id) => format!("{id}-{idx}"),
                None => format!("{}-{}", self.name, nanoid!(8)),
            };
            members.push(ClusterNode {
                consistent_id,
                address: Some(self.member_address(idx)?),
                client: false,
            });
        }
        let addresses: Vec<String> = members.iter().filter_map(|m| m.address.clone()).collect();

        let state = ClusterState::new(&self.name, config.clone());
        let mut ready = state.subscribe();
        {
            let running = self.running.lock();
            if running.is_some() {
                return Err(ServiceError::AlreadyStarted(self.name.clone()).into());
            }
            self.network.bind_all(&addresses, &state)?;
        }

        // configurations are written only once every address is ours
        if let Err(e) = self.render_members(&config, &members).await {
            self.network.unbind_all(&addresses);
            return Err(e);
        }

        {
            let mut running = self.running.lock();
            let shutdown = CancellationToken::new();
            let handles = members
                .into_iter()
                .map(|node| {
                    tokio::spawn(run_member(
                        state.clone(),
                        node,
                        self.join_delay,
                        shutdown.clone(),
                    ))
                })
                .collect();

            *running = Some(Running {
                state: state.clone(),
                shutdown,
                members: handles,
                addresses,
            });
        }

        info!("[{}] starting {} members", self.name, num_nodes);

        ready
            .wait_for(|s| s.servers >= num_nodes)
            .await
            .map_err(|_| self.startup_failed("topology channel closed before members joined"))?;

        info!("[{}] all {} members are live", self.name, num_nodes);
        Ok(())
    }

    fn config(&self) -> Option<NodeConfiguration> {
        self.running.lock().as_ref().map(|r| r.state.config().clone())
    }

    fn discovery_addresses(&self) -> Vec<String> {
        self.running
            .lock()
            .as_ref()
            .map(|r| r.addresses.clone())
            .unwrap_or_default()
    }

    async fn topology(&self) -> Result<TopologySnapshot> {
        self.running
            .lock()
            .as_ref()
            .map(|r| r.state.snapshot())
            .ok_or_else(|| ServiceError::NotStarted(self.name.clone()).into())
    }

    async fn stop(&self) -> Result<()> {
        let running = self.running.lock().take();
        let Some(running) = running else {
            debug!("[{}] stop requested but cluster is not running", self.name);
            return Ok(());
        };

        running.shutdown.cancel();
        self.network.unbind_all(&running.addresses);

        for result in join_all(running.members).await {
            result?;
        }

        info!("[{}] stopped", self.name);
        Ok(())
    }
}

impl Drop for LocalCluster {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.shutdown.cancel();
            self.network.unbind_all(&running.addresses);
        }
    }
}

async fn run_member(
    state: Arc<ClusterState>,
    node: ClusterNode,
    join_delay: Duration,
    shutdown: CancellationToken,
) {
    tokio::select! {
        _ = shutdown.cancelled() => return,
        _ = sleep(join_delay) => {}
    }

    let consistent_id = node.consistent_id.clone();
    if let Err(e) = state.join(node) {
        error!("[{}] member {} failed to join: {}", state.name(), consistent_id, e);
        return;
    }

    shutdown.cancelled().await;
    state.leave(&consistent_id);
}

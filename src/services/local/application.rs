use std::sync::Arc;

use async_trait::async_trait;
use nanoid::nanoid;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use tracing::warn;

use super::ClusterNode;
use super::LocalCompute;
use super::LocalNetwork;
use crate::apps;
use crate::AppContext;
use crate::AppState;
use crate::ApplicationService;
use crate::Error;
use crate::NodeConfiguration;
use crate::Result;
use crate::ServiceError;

struct RunningApp {
    entry_point: String,
    handle: JoinHandle<Result<()>>,
}

/// Runs registered client applications as members of a local cluster,
/// found through the discovery addresses of their configuration.
pub struct LocalApplication {
    network: LocalNetwork,
    running: Mutex<Option<RunningApp>>,
    state: Mutex<Option<watch::Receiver<AppState>>>,
}

impl LocalApplication {
    pub fn new(network: LocalNetwork) -> Self {
        Self {
            network,
            running: Mutex::new(None),
            state: Mutex::new(None),
        }
    }

    /// Last lifecycle marker reported by the application
    pub fn state(&self) -> Option<AppState> {
        self.state.lock().as_ref().map(|rx| *rx.borrow())
    }
}

#[async_trait]
impl ApplicationService for LocalApplication {
    async fn start_async(
        &self,
        config: NodeConfiguration,
        entry_point: String,
        params: serde_json::Value,
    ) -> Result<()> {
        let app = apps::lookup(&entry_point)
            .ok_or_else(|| ServiceError::UnknownEntryPoint(entry_point.clone()))?;
        config.validate()?;

        let discovery = config.discovery_spi().ok_or_else(|| {
            ServiceError::DiscoveryFailed(format!("{entry_point} has no discovery configured"))
        })?;
        let cluster = self.network.resolve(discovery.addresses()).ok_or_else(|| {
            ServiceError::DiscoveryFailed(format!(
                "no cluster reachable at {:?}",
                discovery.addresses()
            ))
        })?;

        if cluster.config().version() != config.version() {
            return Err(ServiceError::StartupFailed {
                service: entry_point,
                reason: format!(
                    "version {} does not match cluster version {}",
                    config.version(),
                    cluster.config().version()
                ),
            }
            .into());
        }

        let node_id = match config.consistent_id() {
            Some(id) => id.to_string(),
            None => format!("app-{}", nanoid!(8)),
        };
        let compute = Arc::new(LocalCompute::new(
            cluster.clone(),
            node_id.clone(),
            config.peer_class_loading_enabled(),
        ));
        let node = ClusterNode {
            consistent_id: node_id.clone(),
            address: None,
            client: config.client_mode(),
        };
        let (ctx, state_rx) = AppContext::new(node_id, config, compute);

        let mut running = self.running.lock();
        if running.is_some() {
            return Err(ServiceError::AlreadyStarted(entry_point).into());
        }

        info!("starting application {} as {}", entry_point, node.consistent_id);
        let handle = tokio::spawn(async move {
            cluster.join(node.clone())?;

            let result = app.run(&ctx, params).await;
            cluster.leave(&node.consistent_id);
            result?;

            if ctx.state() != AppState::Finished {
                return Err(Error::Fatal(format!(
                    "application exited in state {:?} without marking itself finished",
                    ctx.state()
                )));
            }
            Ok::<(), Error>(())
        });

        *running = Some(RunningApp {
            entry_point,
            handle,
        });
        *self.state.lock() = Some(state_rx);
        Ok(())
    }

    async fn await_stopped(&self) -> Result<()> {
        let running = self.running.lock().take();
        let Some(RunningApp {
            entry_point,
            handle,
        }) = running
        else {
            return Err(ServiceError::NotStarted("application".into()).into());
        };

        match handle.await? {
            Ok(()) => {
                info!("application {} stopped", entry_point);
                Ok(())
            }
            Err(e) => {
                warn!("application {} failed: {}", entry_point, e);
                Err(ServiceError::ApplicationFailed {
                    entry_point,
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }
}

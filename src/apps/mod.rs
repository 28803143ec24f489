//! Client applications started by the application collaborator.
//!
//! An application runs as one topology member for its whole lifetime and
//! reports progress through the lifecycle markers of its `AppContext`.
mod compute;
mod exception_generation;
pub use compute::*;
pub use exception_generation::*;
#[cfg(test)]
mod exception_generation_test;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::NodeConfiguration;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Starting,
    Initialized,
    Finished,
}

pub struct AppContext {
    node_id: String,
    config: NodeConfiguration,
    compute: Arc<dyn ComputeApi>,
    state: watch::Sender<AppState>,
}

impl AppContext {
    pub fn new(
        node_id: impl Into<String>,
        config: NodeConfiguration,
        compute: Arc<dyn ComputeApi>,
    ) -> (Self, watch::Receiver<AppState>) {
        let (state, state_rx) = watch::channel(AppState::Starting);
        (
            Self {
                node_id: node_id.into(),
                config,
                compute,
                state,
            },
            state_rx,
        )
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn config(&self) -> &NodeConfiguration {
        &self.config
    }

    /// Compute over every server node except the local one
    pub fn compute_for_remotes(&self) -> Arc<dyn ComputeApi> {
        self.compute.clone()
    }

    pub fn state(&self) -> AppState {
        *self.state.borrow()
    }

    pub fn mark_initialized(&self) {
        info!("application {} initialized", self.node_id);
        self.state.send_replace(AppState::Initialized);
    }

    pub fn mark_finished(&self) {
        info!("application {} finished", self.node_id);
        self.state.send_replace(AppState::Finished);
    }
}

#[async_trait]
pub trait Application: Send + Sync {
    /// Name the application is started by
    fn entry_point(&self) -> &'static str;

    async fn run(
        &self,
        ctx: &AppContext,
        params: serde_json::Value,
    ) -> Result<()>;
}

/// Resolves an entry point to the application registered under it
pub fn lookup(entry_point: &str) -> Option<Arc<dyn Application>> {
    match entry_point {
        EXCEPTION_GENERATION_APP => Some(Arc::new(ExceptionGenerationApplication)),
        _ => None,
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::ClusterNode;
use super::ClusterState;
use crate::ComputeApi;
use crate::ComputeError;
use crate::ComputeJob;
use crate::UserException;

/// Compute over the remote server nodes of a local cluster.
///
/// Jobs and the exceptions they throw cross the node boundary in marshalled
/// form, as they would between processes.
pub struct LocalCompute {
    cluster: Arc<ClusterState>,
    local_node_id: String,
    peer_class_loading_enabled: bool,
}

impl LocalCompute {
    pub(crate) fn new(
        cluster: Arc<ClusterState>,
        local_node_id: String,
        peer_class_loading_enabled: bool,
    ) -> Self {
        Self {
            cluster,
            local_node_id,
            peer_class_loading_enabled,
        }
    }
}

#[async_trait]
impl ComputeApi for LocalCompute {
    async fn execute(
        &self,
        job: ComputeJob,
    ) -> Result<Value, ComputeError> {
        // Job classes only reach remote nodes through peer class loading
        if !self.peer_class_loading_enabled || !self.cluster.config().peer_class_loading_enabled() {
            return Err(ComputeError::Deployment {
                job: job.name().to_string(),
                reason: "peer class loading is disabled".into(),
            });
        }

        let target = self
            .cluster
            .next_remote_server(&self.local_node_id)
            .ok_or(ComputeError::EmptyClusterGroup)?;

        let payload = serde_json::to_vec(&job).map_err(|e| ComputeError::Marshalling(e.to_string()))?;
        tokio::task::yield_now().await;

        execute_remote(&target, &payload)
    }
}

fn execute_remote(
    node: &ClusterNode,
    payload: &[u8],
) -> Result<Value, ComputeError> {
    let job: ComputeJob =
        serde_json::from_slice(payload).map_err(|e| ComputeError::Marshalling(e.to_string()))?;
    debug!("executing {} job on {}", job.name(), node.consistent_id);

    match job.execute(&node.consistent_id) {
        Ok(value) => Ok(value),
        Err(user) => {
            let user = UserException::unmarshal(&user.marshal()?)?;
            Err(ComputeError::remote_user_exception(user))
        }
    }
}

//! End-to-end scenarios and the helpers they share.
//!
//! A scenario owns its configuration tree and drives collaborators through
//! `ClusterService` and `ApplicationService`. Every wait on a collaborator
//! is bounded by `HarnessConfig`, and any failure ends the scenario.
mod compute_exception_handling;
pub use compute_exception_handling::*;
#[cfg(test)]
mod compute_exception_handling_test;

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::ClusterService;
use crate::HarnessConfig;
use crate::ProductVersion;
use crate::Result;
use crate::ScenarioError;
use crate::ServiceError;
use crate::TopologyCheckConfig;

/// What a scenario is run with
#[derive(Debug, Clone)]
pub struct TestContext {
    pub test_name: String,
    /// Nodes allocated to the test, client roles included
    pub expected_num_nodes: usize,
    pub version: ProductVersion,
    pub config: HarnessConfig,
}

impl TestContext {
    pub fn new(
        test_name: impl Into<String>,
        expected_num_nodes: usize,
        version: ProductVersion,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            expected_num_nodes,
            version,
            config: HarnessConfig::default(),
        }
    }

    pub fn with_config(
        self,
        config: HarnessConfig,
    ) -> Self {
        Self { config, ..self }
    }
}

/// Awaits `fut` for at most `limit`
pub async fn bounded<T, F>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} timed out after {:?}", operation, limit);
            Err(ServiceError::Timeout {
                operation,
                duration: limit,
            }
            .into())
        }
    }
}

/// Waits until the cluster reports topology version `expected`.
///
/// The version never goes down, so observing a larger one fails at once;
/// otherwise the check gives up after `check_timeout` and reports the last
/// observed value.
pub async fn check_topology<C>(
    cluster: &C,
    expected: u64,
    settings: &TopologyCheckConfig,
) -> Result<()>
where
    C: ClusterService + ?Sized,
{
    let deadline = Instant::now() + settings.check_timeout();

    loop {
        let observed = cluster.topology_version().await?;
        if observed == expected {
            info!("topology check passed: {}", observed);
            return Ok(());
        }

        if observed > expected || Instant::now() >= deadline {
            warn!("topology check failed: expected {}, observed {}", expected, observed);
            return Err(ScenarioError::TopologyMismatch { expected, observed }.into());
        }

        debug!("waiting for topology {}, observed {}", expected, observed);
        sleep(settings.poll_interval()).await;
    }
}

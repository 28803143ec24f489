use serde_json::json;
use tracing::info;
use tracing::warn;

use super::bounded;
use super::check_topology;
use super::TestContext;
use crate::discovery;
use crate::ApplicationService;
use crate::ClusterService;
use crate::MetricExporter;
use crate::NodeConfiguration;
use crate::Result;
use crate::ScenarioError;
use crate::ServiceError;
use crate::EXCEPTION_GENERATION_APP;

/// Custom compute exception handling by a client node.
///
/// Starts `expected_num_nodes - 1` servers, runs the exception generation
/// application as a client against them, and checks topology before and
/// after: the client joining and leaving adds two topology versions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComputeExceptionHandlingTest;

impl ComputeExceptionHandlingTest {
    /// Server configuration the cluster is started with
    pub fn node_config(ctx: &TestContext) -> NodeConfiguration {
        NodeConfiguration::new(ctx.version)
            .with_metric_exporters([MetricExporter::Jmx])
            .with_peer_class_loading_enabled(true)
    }

    pub async fn run<C, A>(
        &self,
        ctx: &TestContext,
        ignites: &C,
        app: &A,
    ) -> Result<()>
    where
        C: ClusterService + ?Sized,
        A: ApplicationService + ?Sized,
    {
        if ctx.expected_num_nodes < 2 {
            return Err(ScenarioError::InvalidContext(format!(
                "{} needs at least 2 nodes, got {}",
                ctx.test_name, ctx.expected_num_nodes
            ))
            .into());
        }

        let result = self.run_inner(ctx, ignites, app).await;

        // Members are stopped whatever the verdict; the first failure wins
        let stopped = bounded(
            "cluster stop",
            ctx.config.cluster.shutdown_timeout(),
            ignites.stop(),
        )
        .await;

        match (result, stopped) {
            (Err(e), _) => {
                warn!("{} failed: {}", ctx.test_name, e);
                Err(e)
            }
            (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => {
                info!("{} passed", ctx.test_name);
                Ok(())
            }
        }
    }

    async fn run_inner<C, A>(
        &self,
        ctx: &TestContext,
        ignites: &C,
        app: &A,
    ) -> Result<()>
    where
        C: ClusterService + ?Sized,
        A: ApplicationService + ?Sized,
    {
        let nodes_count = ctx.expected_num_nodes - 1;
        let node_config = Self::node_config(ctx);

        info!("{}: starting {} server nodes", ctx.test_name, nodes_count);
        bounded(
            "cluster start",
            ctx.config.cluster.startup_timeout(),
            ignites.start(node_config, nodes_count),
        )
        .await?;

        check_topology(ignites, nodes_count as u64, &ctx.config.topology).await?;

        let client_config = ignites
            .config()
            .ok_or_else(|| ServiceError::NotStarted("cluster".into()))?
            .with_client_mode(true)
            .with_discovery_spi(discovery::from_cluster(ignites));

        info!("{}: starting {}", ctx.test_name, EXCEPTION_GENERATION_APP);
        app.start_async(client_config, EXCEPTION_GENERATION_APP.to_string(), json!({}))
            .await?;

        bounded(
            "application await_stopped",
            ctx.config.application.await_stopped_timeout(),
            app.await_stopped(),
        )
        .await?;

        check_topology(ignites, nodes_count as u64 + 2, &ctx.config.topology).await
    }
}

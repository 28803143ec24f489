use std::time::Duration;

use ducktest::ApplicationService;
use ducktest::ClusterService;
use ducktest::ComputeExceptionHandlingTest;
use ducktest::Error;
use ducktest::LocalCluster;
use ducktest::LocalNetwork;
use ducktest::ScenarioError;
use ducktest::ServiceError;
use ducktest::EXCEPTION_GENERATION_APP;
use serde_json::json;
use tracing_test::traced_test;

use crate::common::local_env;
use crate::common::test_context;

#[tokio::test]
#[traced_test]
async fn test_scenario_rejects_single_node_allocation() {
    let env = local_env("ignite");
    let ctx = test_context("too_small", 1);

    let result = ComputeExceptionHandlingTest.run(&ctx, &env.cluster, &env.app).await;

    assert!(matches!(result, Err(Error::Scenario(ScenarioError::InvalidContext(_)))));
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_scenario_bounds_cluster_that_never_becomes_ready() {
    let network = LocalNetwork::new();
    let cluster =
        LocalCluster::new("stuck", network.clone()).with_join_delay(Duration::from_secs(24 * 3600));
    let app = ducktest::LocalApplication::new(network.clone());
    let ctx = test_context("stuck", 3);

    let result = ComputeExceptionHandlingTest.run(&ctx, &cluster, &app).await;

    assert!(matches!(
        result,
        Err(Error::Service(ServiceError::Timeout {
            operation: "cluster start",
            ..
        }))
    ));
    assert!(!network.is_bound("127.0.0.1:47500"));
    assert!(logs_contain("cluster start timed out"));
}

/// The application fails when jobs cannot be deployed to the servers
#[tokio::test]
#[traced_test]
async fn test_application_failure_is_reported() {
    let env = local_env("no-p2p");
    let server_config = ducktest::NodeConfiguration::new(crate::common::VERSION);
    env.cluster.start(server_config, 2).await.expect("cluster start");

    let client_config = env
        .cluster
        .config()
        .expect("running")
        .with_client_mode(true)
        .with_discovery_spi(ducktest::discovery::from_cluster(&env.cluster));
    env.app
        .start_async(client_config, EXCEPTION_GENERATION_APP.into(), json!({}))
        .await
        .expect("start_async");

    let result = env.app.await_stopped().await;

    assert!(matches!(
        result,
        Err(Error::Service(ServiceError::ApplicationFailed { .. }))
    ));
    // the client joined and left even though it failed
    assert_eq!(env.cluster.topology_version().await.expect("topology"), 4);
    env.cluster.stop().await.expect("stop");
}

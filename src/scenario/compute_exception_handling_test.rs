use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing_test::traced_test;

use super::*;
use crate::ApplicationServiceConfig;
use crate::ClusterServiceConfig;
use crate::Error;
use crate::HarnessConfig;
use crate::LocalCluster;
use crate::LocalNetwork;
use crate::MetricExporter;
use crate::MockApplicationService;
use crate::MockClusterService;
use crate::NodeConfiguration;
use crate::ProductVersion;
use crate::ScenarioError;
use crate::ServiceError;
use crate::TopologyCheckConfig;
use crate::EXCEPTION_GENERATION_APP;

const VERSION: ProductVersion = ProductVersion::release(2, 16, 0);

fn fast_config() -> HarnessConfig {
    HarnessConfig {
        cluster: ClusterServiceConfig {
            startup_timeout_in_ms: 1000,
            shutdown_timeout_in_ms: 1000,
        },
        application: ApplicationServiceConfig {
            await_stopped_timeout_in_ms: 1000,
        },
        topology: TopologyCheckConfig {
            check_timeout_in_ms: 500,
            poll_interval_in_ms: 100,
        },
    }
}

fn context(expected_num_nodes: usize) -> TestContext {
    TestContext::new("compute_exception_handling", expected_num_nodes, VERSION).with_config(fast_config())
}

/// Cluster that reports `before` until the application stopped, then `after`
fn mock_cluster(
    nodes: usize,
    before: u64,
    after: u64,
    app_stopped: Arc<AtomicUsize>,
) -> MockClusterService {
    let mut cluster = MockClusterService::new();
    cluster
        .expect_start()
        .withf(move |config, n| {
            *n == nodes
                && !config.client_mode()
                && config.peer_class_loading_enabled()
                && config.metric_exporters().contains(&MetricExporter::Jmx)
        })
        .times(1)
        .returning(|_, _| Ok(()));
    cluster
        .expect_config()
        .returning(|| Some(NodeConfiguration::new(VERSION).with_peer_class_loading_enabled(true)));
    cluster
        .expect_discovery_addresses()
        .returning(|| vec!["127.0.0.1:47500".into(), "127.0.0.1:47501".into()]);
    cluster.expect_topology_version().returning(move || {
        if app_stopped.load(Ordering::SeqCst) == 0 {
            Ok(before)
        } else {
            Ok(after)
        }
    });
    cluster.expect_stop().times(1).returning(|| Ok(()));
    cluster
}

fn mock_app(app_stopped: Arc<AtomicUsize>) -> MockApplicationService {
    let mut app = MockApplicationService::new();
    app.expect_start_async()
        .withf(|config, entry_point, _| {
            config.client_mode()
                && entry_point == EXCEPTION_GENERATION_APP
                && config.version() == VERSION
                && config
                    .discovery_spi()
                    .is_some_and(|d| d.addresses() == ["127.0.0.1:47500", "127.0.0.1:47501"])
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    app.expect_await_stopped().times(1).returning(move || {
        app_stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    app
}

#[tokio::test]
#[traced_test]
async fn scenario_should_pass_when_client_adds_two_versions() {
    let app_stopped = Arc::new(AtomicUsize::new(0));
    let cluster = mock_cluster(2, 2, 4, app_stopped.clone());
    let app = mock_app(app_stopped);

    ComputeExceptionHandlingTest
        .run(&context(3), &cluster, &app)
        .await
        .unwrap();

    assert!(logs_contain("compute_exception_handling passed"));
}

#[tokio::test(start_paused = true)]
async fn scenario_should_fail_when_client_left_no_trace() {
    let app_stopped = Arc::new(AtomicUsize::new(0));
    let cluster = mock_cluster(2, 2, 3, app_stopped.clone());
    let app = mock_app(app_stopped);

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    assert!(matches!(
        result,
        Err(Error::Scenario(ScenarioError::TopologyMismatch {
            expected: 4,
            observed: 3
        }))
    ));
}

#[tokio::test]
async fn scenario_should_fail_on_extra_topology_change() {
    let app_stopped = Arc::new(AtomicUsize::new(0));
    let cluster = mock_cluster(2, 2, 5, app_stopped.clone());
    let app = mock_app(app_stopped);

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    assert!(matches!(
        result,
        Err(Error::Scenario(ScenarioError::TopologyMismatch {
            expected: 4,
            observed: 5
        }))
    ));
}

#[tokio::test]
async fn scenario_should_size_cluster_from_context() {
    let app_stopped = Arc::new(AtomicUsize::new(0));
    let cluster = mock_cluster(4, 4, 6, app_stopped.clone());
    let app = mock_app(app_stopped);

    ComputeExceptionHandlingTest
        .run(&context(5), &cluster, &app)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn scenario_should_fail_when_servers_miss_topology() {
    let mut cluster = MockClusterService::new();
    cluster.expect_start().returning(|_, _| Ok(()));
    cluster.expect_topology_version().returning(|| Ok(1));
    cluster.expect_stop().times(1).returning(|| Ok(()));
    let mut app = MockApplicationService::new();
    app.expect_start_async().times(0);

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    assert!(matches!(
        result,
        Err(Error::Scenario(ScenarioError::TopologyMismatch {
            expected: 2,
            observed: 1
        }))
    ));
}

#[tokio::test]
async fn scenario_should_stop_cluster_after_start_failure() {
    let mut cluster = MockClusterService::new();
    cluster.expect_start().returning(|_, _| {
        Err(ServiceError::StartupFailed {
            service: "ignite".into(),
            reason: "port in use".into(),
        }
        .into())
    });
    cluster.expect_topology_version().times(0);
    cluster.expect_stop().times(1).returning(|| Ok(()));
    let mut app = MockApplicationService::new();
    app.expect_start_async().times(0);

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    assert!(matches!(result, Err(Error::Service(ServiceError::StartupFailed { .. }))));
}

#[tokio::test]
async fn scenario_should_propagate_application_failure() {
    let mut cluster = MockClusterService::new();
    cluster.expect_start().returning(|_, _| Ok(()));
    cluster
        .expect_config()
        .returning(|| Some(NodeConfiguration::new(VERSION)));
    cluster
        .expect_discovery_addresses()
        .returning(|| vec!["127.0.0.1:47500".into()]);
    cluster.expect_topology_version().times(1).returning(|| Ok(2));
    cluster.expect_stop().times(1).returning(|| Ok(()));
    let mut app = MockApplicationService::new();
    app.expect_start_async().returning(|_, _, _| Ok(()));
    app.expect_await_stopped().returning(|| {
        Err(ServiceError::ApplicationFailed {
            entry_point: EXCEPTION_GENERATION_APP.into(),
            reason: "Exception has not been thrown.".into(),
        }
        .into())
    });

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    assert!(matches!(result, Err(Error::Service(ServiceError::ApplicationFailed { .. }))));
}

#[tokio::test]
async fn scenario_should_report_stop_failure_after_success() {
    let app_stopped = Arc::new(AtomicUsize::new(0));
    let mut cluster = MockClusterService::new();
    cluster.expect_start().returning(|_, _| Ok(()));
    cluster
        .expect_config()
        .returning(|| Some(NodeConfiguration::new(VERSION)));
    cluster
        .expect_discovery_addresses()
        .returning(|| vec!["127.0.0.1:47500".into(), "127.0.0.1:47501".into()]);
    let stopped = app_stopped.clone();
    cluster
        .expect_topology_version()
        .returning(move || Ok(if stopped.load(Ordering::SeqCst) == 0 { 2 } else { 4 }));
    cluster
        .expect_stop()
        .returning(|| Err(ServiceError::NotStarted("ignite".into()).into()));
    let app = mock_app(app_stopped);

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    assert!(matches!(result, Err(Error::Service(ServiceError::NotStarted(_)))));
}

#[tokio::test]
async fn scenario_should_reject_context_without_client_slot() {
    let mut cluster = MockClusterService::new();
    cluster.expect_start().times(0);
    cluster.expect_stop().times(0);
    let app = MockApplicationService::new();

    let result = ComputeExceptionHandlingTest.run(&context(1), &cluster, &app).await;

    assert!(matches!(result, Err(Error::Scenario(ScenarioError::InvalidContext(_)))));
}

#[tokio::test(start_paused = true)]
async fn scenario_should_bound_cluster_that_never_becomes_ready() {
    let network = LocalNetwork::new();
    let cluster = LocalCluster::new("ignite", network.clone()).with_join_delay(Duration::from_secs(3600));
    let app = MockApplicationService::new();

    let result = ComputeExceptionHandlingTest.run(&context(3), &cluster, &app).await;

    match result {
        Err(Error::Service(ServiceError::Timeout { operation, .. })) => {
            assert_eq!(operation, "cluster start");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    // the scenario still stopped the members it had started
    assert!(!network.is_bound("127.0.0.1:47500"));
}

#[test]
fn node_config_should_enable_compute_prerequisites() {
    let config = ComputeExceptionHandlingTest::node_config(&context(3));

    assert_eq!(config.version(), VERSION);
    assert!(!config.client_mode());
    assert!(config.peer_class_loading_enabled());
    assert!(config.metric_exporters().contains(&MetricExporter::Jmx));
}

use std::time::Duration;

use ducktest::HarnessConfig;
use ducktest::LocalApplication;
use ducktest::LocalCluster;
use ducktest::LocalNetwork;
use ducktest::ProductVersion;
use ducktest::TestContext;

pub const VERSION: ProductVersion = ProductVersion::release(2, 16, 0);

// Slow enough that members visibly join after `start` returns control
pub const JOIN_DELAY_IN_MS: u64 = 20;

pub struct LocalEnv {
    pub network: LocalNetwork,
    pub cluster: LocalCluster,
    pub app: LocalApplication,
}

/// Cluster and application collaborators sharing one in-process network
pub fn local_env(name: &str) -> LocalEnv {
    let network = LocalNetwork::new();
    let cluster = LocalCluster::new(name, network.clone())
        .with_join_delay(Duration::from_millis(JOIN_DELAY_IN_MS));
    let app = LocalApplication::new(network.clone());
    LocalEnv {
        network,
        cluster,
        app,
    }
}

pub fn harness_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.cluster.startup_timeout_in_ms = 5_000;
    config.cluster.shutdown_timeout_in_ms = 2_000;
    config.application.await_stopped_timeout_in_ms = 10_000;
    config.topology.check_timeout_in_ms = 2_000;
    config.topology.poll_interval_in_ms = 20;
    config
}

pub fn test_context(
    test_name: &str,
    expected_num_nodes: usize,
) -> TestContext {
    TestContext::new(test_name, expected_num_nodes, VERSION).with_config(harness_config())
}

use std::sync::Arc;

use ducktest::ClusterService;
use ducktest::ComputeExceptionHandlingTest;
use ducktest::HarnessConfig;
use ducktest::LocalCluster;
use ducktest::LocalNetwork;
use ducktest::Result;
use ducktest::SpringXmlRenderer;
use tracing_test::traced_test;

use crate::common::local_env;
use crate::common::test_context;

/// Three allocated nodes: two servers plus the client application
#[tokio::test]
#[traced_test]
async fn test_compute_exception_handling_3_nodes() -> Result<()> {
    let env = local_env("ignite");
    let ctx = test_context("compute_exception_handling", 3);

    ComputeExceptionHandlingTest.run(&ctx, &env.cluster, &env.app).await?;

    assert!(logs_contain("compute_exception_handling passed"));
    assert!(logs_contain("topology check passed: 2"));
    assert!(logs_contain("topology check passed: 4"));

    // Members were released by the scenario
    assert!(env.cluster.config().is_none());
    assert!(!env.network.is_bound("127.0.0.1:47500"));
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_compute_exception_handling_5_nodes() -> Result<()> {
    let env = local_env("ignite");
    let ctx = test_context("compute_exception_handling_5", 5);

    ComputeExceptionHandlingTest.run(&ctx, &env.cluster, &env.app).await?;

    assert!(logs_contain("topology check passed: 6"));
    Ok(())
}

/// Settings loaded from a file drive the same scenario
#[tokio::test]
#[traced_test]
async fn test_scenario_with_file_settings_and_rendered_configs() -> Result<()> {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings_path = dir.path().join("harness.toml");
    std::fs::write(
        &settings_path,
        r#"
        [topology]
        check_timeout_in_ms = 3000
        poll_interval_in_ms = 10
        "#,
    )
    .expect("write settings");

    let config = HarnessConfig::default()
        .with_override_config(settings_path.to_str().expect("utf8 path"))?
        .validate()?;
    assert_eq!(config.topology.poll_interval_in_ms, 10);

    let render_dir = dir.path().join("configs");
    let network = LocalNetwork::new();
    let cluster = LocalCluster::new("rendered", network.clone())
        .with_base_port(48500)
        .with_render_dir(&render_dir, Arc::new(SpringXmlRenderer));
    let app = ducktest::LocalApplication::new(network);
    let ctx = test_context("rendered", 3).with_config(config);

    ComputeExceptionHandlingTest.run(&ctx, &cluster, &app).await?;

    let rendered: Vec<_> = std::fs::read_dir(&render_dir)
        .expect("render dir")
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(rendered.len(), 2);
    for entry in rendered {
        let xml = std::fs::read_to_string(entry.path()).expect("read rendered");
        assert!(xml.contains(r#"<property name="peerClassLoadingEnabled" value="true"/>"#));
        assert!(xml.contains(r#"<property name="clientMode" value="false"/>"#));
    }
    Ok(())
}

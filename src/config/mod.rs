//! Configuration for the harness and for the product under test.
//!
//! Two families live here:
//! - Schema values handed to the cluster (`NodeConfiguration`,
//!   `DataStorageConfiguration`, ...), immutable and copy-with-override
//! - Harness settings (`HarnessConfig`), loaded hierarchically:
//!   1. Default values from code
//!   2. Configuration file specified by `CONFIG_PATH`
//!   3. Environment variables (highest priority)
mod data_storage;
pub mod discovery;
mod harness;
mod node;
mod warm_up;
pub use data_storage::*;
pub use discovery::DiscoverySpi;
pub use harness::*;
pub use node::*;
pub use warm_up::*;
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_PATH_ENV;
use crate::constants::ENV_PREFIX;
use crate::Result;

/// Settings of the harness itself: the bounds it puts on collaborators
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct HarnessConfig {
    /// Cluster lifecycle waits
    #[serde(default)]
    pub cluster: ClusterServiceConfig,
    /// Client application lifecycle waits
    #[serde(default)]
    pub application: ApplicationServiceConfig,
    /// Topology polling
    #[serde(default)]
    pub topology: TopologyCheckConfig,
}

impl HarnessConfig {
    /// Creates a new configuration with hierarchical loading:
    /// 1. Default values as base layer
    /// 2. Configuration file from `CONFIG_PATH` environment variable
    /// 3. Environment variables with `DUCKTEST__` prefix (highest priority)
    ///
    /// # Note
    /// This method does NOT validate. Call `validate()` once every override
    /// has been applied.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance
    pub fn validate(self) -> Result<Self> {
        self.cluster.validate()?;
        self.application.validate()?;
        self.topology.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

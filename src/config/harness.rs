use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Bounded waits on the cluster collaborator
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterServiceConfig {
    /// Upper bound for all members to report live, in milliseconds
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_in_ms: u64,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_in_ms: u64,
}

impl Default for ClusterServiceConfig {
    fn default() -> Self {
        Self {
            startup_timeout_in_ms: default_startup_timeout(),
            shutdown_timeout_in_ms: default_shutdown_timeout(),
        }
    }
}

impl ClusterServiceConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_in_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_in_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.startup_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig("cluster.startup_timeout_in_ms must be > 0".into()));
        }
        if self.shutdown_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "cluster.shutdown_timeout_in_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Bounded waits on the client application collaborator
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApplicationServiceConfig {
    #[serde(default = "default_await_stopped_timeout")]
    pub await_stopped_timeout_in_ms: u64,
}

impl Default for ApplicationServiceConfig {
    fn default() -> Self {
        Self {
            await_stopped_timeout_in_ms: default_await_stopped_timeout(),
        }
    }
}

impl ApplicationServiceConfig {
    pub fn await_stopped_timeout(&self) -> Duration {
        Duration::from_millis(self.await_stopped_timeout_in_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.await_stopped_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "application.await_stopped_timeout_in_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Topology polling parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopologyCheckConfig {
    #[serde(default = "default_check_timeout")]
    pub check_timeout_in_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_in_ms: u64,
}

impl Default for TopologyCheckConfig {
    fn default() -> Self {
        Self {
            check_timeout_in_ms: default_check_timeout(),
            poll_interval_in_ms: default_poll_interval(),
        }
    }
}

impl TopologyCheckConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_in_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_in_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_timeout_in_ms == 0 || self.poll_interval_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "topology check timeout and poll interval must be > 0".into(),
            ));
        }
        if self.poll_interval_in_ms > self.check_timeout_in_ms {
            return Err(Error::InvalidConfig(format!(
                "topology.poll_interval_in_ms {} exceeds check_timeout_in_ms {}",
                self.poll_interval_in_ms, self.check_timeout_in_ms
            )));
        }
        Ok(())
    }
}

fn default_startup_timeout() -> u64 {
    60_000
}
fn default_shutdown_timeout() -> u64 {
    10_000
}
fn default_await_stopped_timeout() -> u64 {
    60_000
}
fn default_check_timeout() -> u64 {
    10_000
}
fn default_poll_interval() -> u64 {
    100
}

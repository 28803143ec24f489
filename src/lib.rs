//! Integration-test harness for a clustered database.
//!
//! - `config`: storage-engine and node configuration schema, harness settings
//! - `render`: schema values into the engine's native configuration artifacts
//! - `services`: cluster and client-application lifecycle collaborators
//! - `apps`: client applications run against the cluster
//! - `scenario`: end-to-end tests asserting on topology

mod apps;
mod config;
mod constants;
mod errors;
mod render;
mod scenario;
mod services;
mod version;

pub use crate::config::*;
pub use apps::*;
pub use constants::DEFAULT_REGION_INITIAL_SIZE;
pub use constants::DEFAULT_REGION_MAX_SIZE;
pub use constants::DEFAULT_REGION_NAME;
pub use constants::REMOTE_JOB_USER_EXCEPTION;
pub use errors::*;
pub use render::*;
pub use scenario::*;
pub use services::*;
pub use version::*;

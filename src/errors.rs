//! Harness Error Hierarchy
//!
//! Defines the error types surfaced by the configuration schema, the service
//! collaborators and the scenarios, categorized by the layer that raised them.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Harness settings could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration schema invariant violations
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Cluster or application lifecycle failures
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Scenario verdicts (assertion and topology failures)
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// Rendering a configuration into its native artifact failed
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Unrecoverable failures
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A service could not reach its ready state
    #[error("Failed to start {service}: {reason}")]
    StartupFailed { service: String, reason: String },

    /// A bounded wait expired
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        operation: &'static str,
        duration: Duration,
    },

    /// The service was queried before `start` completed
    #[error("Service {0} is not started")]
    NotStarted(String),

    #[error("Service {0} is already started")]
    AlreadyStarted(String),

    /// None of the configured discovery addresses resolved to a running cluster
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Unknown application entry point: {0}")]
    UnknownEntryPoint(String),

    /// The client application exited abnormally
    #[error("Application {entry_point} failed: {reason}")]
    ApplicationFailed { entry_point: String, reason: String },

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Observed topology differs from the expected one
    #[error("Topology mismatch: expected {expected}, observed {observed}")]
    TopologyMismatch { expected: u64, observed: u64 },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// The test context cannot drive the scenario
    #[error("Invalid test context: {0}")]
    InvalidContext(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a rendered artifact to disk failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The XML event writer rejected an event
    #[error("XML writer error: {0}")]
    Xml(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Render(RenderError::Serialization(e))
    }
}

impl From<JoinError> for Error {
    fn from(e: JoinError) -> Self {
        Error::Service(ServiceError::TaskFailed(e))
    }
}

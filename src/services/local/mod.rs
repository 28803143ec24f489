//! In-process collaborators: cluster members and client applications run as
//! tasks on the current tokio runtime and meet through a `LocalNetwork`.
mod application;
mod cluster;
mod compute;
mod network;
mod topology;
pub use application::*;
pub use cluster::*;
pub use compute::*;
pub use network::*;
pub use topology::ClusterNode;
pub(crate) use topology::ClusterState;

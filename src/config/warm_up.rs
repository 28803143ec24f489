use serde::Deserialize;
use serde::Serialize;

/// Strategy a data region uses to pre-load persisted pages after restart.
///
/// The set of strategies is fixed by the engine.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum WarmUpConfiguration {
    /// Skip warm-up entirely
    NoOp,
    /// Load every persisted page of the region into memory
    LoadAll,
}

impl WarmUpConfiguration {
    /// Engine class implementing this strategy
    pub fn class_name(&self) -> &'static str {
        match self {
            WarmUpConfiguration::NoOp => {
                "org.apache.ignite.configuration.NoOpWarmUpConfiguration"
            }
            WarmUpConfiguration::LoadAll => {
                "org.apache.ignite.configuration.LoadAllWarmUpConfiguration"
            }
        }
    }
}

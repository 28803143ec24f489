use super::ConfigRenderer;
use crate::NodeConfiguration;
use crate::Result;

/// Pretty-printed JSON, the form application parameters are passed in
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ConfigRenderer for JsonRenderer {
    fn render(
        &self,
        config: &NodeConfiguration,
    ) -> Result<String> {
        Ok(serde_json::to_string_pretty(config)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

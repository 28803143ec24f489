//! Rendering of configuration schema values into the native artifacts the
//! engine under test consumes.
//!
//! Renderers never emit unset optional fields: an absent value leaves the
//! engine's own default in effect, which is not the same as writing that
//! default explicitly.
mod json;
mod spring_xml;
pub use json::*;
pub use spring_xml::*;

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::NodeConfiguration;
use crate::RenderError;
use crate::Result;

pub trait ConfigRenderer: Send + Sync {
    /// Renders one node configuration into its native textual form
    fn render(
        &self,
        config: &NodeConfiguration,
    ) -> Result<String>;

    /// File extension of the rendered artifact, without the dot
    fn extension(&self) -> &'static str;
}

/// Renders `config` and writes it to `<dir>/<name>.<extension>`
pub async fn write_rendered(
    renderer: &dyn ConfigRenderer,
    config: &NodeConfiguration,
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    let content = renderer.render(config)?;
    let path = dir.join(format!("{}.{}", name, renderer.extension()));

    tokio::fs::create_dir_all(dir).await.map_err(|e| RenderError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;
    tokio::fs::write(&path, content).await.map_err(|e| RenderError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    debug!("rendered configuration written to {}", path.display());
    Ok(path)
}

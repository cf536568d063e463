pub mod convert;
pub mod init;
pub mod inspect;
pub mod prune;

use anyhow::Context;
use schemtrace::config::GraphConfig;
use schemtrace::detections::Detections;
use std::path::Path;

/// Load the YAML config if given, else defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<GraphConfig> {
    match path {
        Some(p) => GraphConfig::load(p)
            .with_context(|| format!("loading config {}", p.display())),
        None => Ok(GraphConfig::default()),
    }
}

/// Load detections, applying a command-line scale override.
pub fn load_detections(path: &Path, scale: Option<f64>) -> anyhow::Result<Detections> {
    let mut detections = Detections::load(path)
        .with_context(|| format!("loading detections {}", path.display()))?;
    if let Some(s) = scale {
        detections.scale = Some(s);
    }
    Ok(detections)
}

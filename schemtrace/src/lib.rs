//! Schematic graph assembly and LTspice export for detected circuit drawings.
//!
//! Converts the output of external line detection, classification and OCR
//! (a [`detections::Detections`] record) into a connected component graph,
//! then serializes it as an LTspice `.asc` schematic.
//!
//! # Pipeline
//!
//! ```text
//! Detections
//!   → loose graph        (one node per confident endpoint)
//!   → deduplicated graph (same-type near-duplicates collapsed)
//!   → linked graph       (terminal lines, then neighbor resolution)
//!   → normalized graph   (orientation, grid snap, grid alignment)
//!   → .asc text          (header, wires, symbols)
//! ```
//!
//! # Example
//!
//! ```rust
//! use schemtrace::config::GraphConfig;
//! use schemtrace::detections::Detections;
//!
//! let graph = schemtrace::generate_graph(&Detections::default(), &GraphConfig::default()).unwrap();
//! assert_eq!(schemtrace::to_asc(&graph, &GraphConfig::default()), "SHEET 1 1000 1000\n");
//! ```

pub mod config;
pub mod detections;
pub mod graph;
pub mod label;
pub mod lines;
pub mod ltspice;
pub mod normalize;
pub mod poi;
pub mod symbols;
pub mod types;

use config::{ConfigError, GraphConfig};
use detections::{DetectionError, Detections};
use graph::{AssemblyError, Assembler, Graph};
use ltspice::{AscEmitter, EmitError};
use normalize::Normalizer;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Detections(#[from] DetectionError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("Failed to serialize graph: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the normalized graph for one schematic.
///
/// A `scale` carried by the detections replaces the configured factor for
/// this run.
pub fn generate_graph(detections: &Detections, config: &GraphConfig) -> Result<Graph, Error> {
    let config = match detections.scale {
        Some(scale) => config.with_scale(scale),
        None => config.clone(),
    };
    detections.validate()?;
    let normalizer = Normalizer::new(config.clone())?;

    let mut graph = Assembler::new(config).assemble(detections)?;
    normalizer.normalize(&mut graph);
    Ok(graph)
}

/// Render a graph as `.asc` text.
pub fn to_asc(graph: &Graph, config: &GraphConfig) -> String {
    AscEmitter::new(config.clone()).render(graph)
}

/// Write a graph as an `.asc` file.
pub fn write_asc(graph: &Graph, config: &GraphConfig, path: impl AsRef<Path>) -> Result<(), Error> {
    AscEmitter::new(config.clone()).write(graph, path)?;
    Ok(())
}

/// Serialize a graph to pretty JSON for debugging.
pub fn to_json(graph: &Graph) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(graph)?)
}

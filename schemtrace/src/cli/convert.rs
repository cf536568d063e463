use anyhow::Context;
use colored::Colorize;
use schemtrace::ltspice::AscEmitter;
use std::path::Path;

pub fn run(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    scale: Option<f64>,
    dump_graph: Option<&Path>,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let detections = super::load_detections(input, scale)?;

    let graph = schemtrace::generate_graph(&detections, &config)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("asc"));
    schemtrace::write_asc(&graph, &config, &output)?;

    if let Some(dump) = dump_graph {
        let json = schemtrace::to_json(&graph)?;
        std::fs::write(dump, json).with_context(|| format!("writing {}", dump.display()))?;
        tracing::info!(path = %dump.display(), "wrote graph dump");
    }

    let emitter = AscEmitter::new(config);
    println!(
        "{} {} ({} nodes, {} wires, {} symbols)",
        "✓".green(),
        output.display(),
        graph.len(),
        emitter.wires(&graph).len(),
        emitter.symbols(&graph).len(),
    );
    Ok(())
}

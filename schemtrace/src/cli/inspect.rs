use colored::Colorize;
use schemtrace::graph::Graph;
use schemtrace::ltspice::AscEmitter;
use schemtrace::poi::{ComponentType, Poi};
use schemtrace::types::Terminal;
use std::path::Path;

pub fn run(input: &Path, config_path: Option<&Path>, scale: Option<f64>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let detections = super::load_detections(input, scale)?;
    let graph = schemtrace::generate_graph(&detections, &config)?;

    println!("{}", format!("Nodes ({})", graph.len()).bold());
    println!("{}", "─".repeat(72));
    println!(
        "{:>4}  {:<5} {:<10} {:>12}  {:<4} {:>5} {:>5}  {}",
        "id", "from", "type", "position", "rot", "A", "B", "label"
    );
    for (id, poi) in graph.iter() {
        println!(
            "{:>4}  {:<5} {:<10} {:>12}  {:<4} {:>5} {:>5}  {}",
            id.0,
            poi.endpoint.to_string(),
            colored_kind(poi.kind),
            poi.position.to_string(),
            poi.rotation.to_string(),
            link(poi, Terminal::A),
            link(poi, Terminal::B),
            poi.label.as_deref().unwrap_or("").dimmed(),
        );
    }

    summary(&graph, &AscEmitter::new(config));
    Ok(())
}

fn colored_kind(kind: ComponentType) -> colored::ColoredString {
    let name = format!("{:<10}", kind.name());
    if kind.is_two_terminal() {
        name.green()
    } else if kind == ComponentType::Ground {
        name.blue()
    } else {
        name.dimmed()
    }
}

fn link(poi: &Poi, t: Terminal) -> String {
    poi.terminal(t)
        .map(|id| id.0.to_string())
        .unwrap_or_else(|| "-".into())
}

fn summary(graph: &Graph, emitter: &AscEmitter) {
    let unresolved = graph
        .nodes
        .iter()
        .filter(|p| p.kind.is_two_terminal())
        .flat_map(|p| [Terminal::A, Terminal::B].map(|t| p.terminal(t)))
        .filter(Option::is_none)
        .count();

    println!("{}", "─".repeat(72));
    println!(
        "{} wires, {} symbols/flags",
        emitter.wires(graph).len(),
        emitter.symbols(graph).len()
    );
    if unresolved > 0 {
        println!(
            "{} {} part terminal(s) left unconnected",
            "!".yellow(),
            unresolved
        );
    }
}

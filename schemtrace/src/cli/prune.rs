use anyhow::Context;
use colored::Colorize;
use schemtrace::lines::prune_similar;
use schemtrace::types::Line;
use std::path::Path;

pub fn run(input: &Path, output: Option<&Path>, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let lines: Vec<Line> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing line list {}", input.display()))?;

    let kept = prune_similar(&lines, config.line_point_distance);
    let json = serde_json::to_string(&kept)?;

    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} kept {} of {} lines → {}",
                "✓".green(),
                kept.len(),
                lines.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

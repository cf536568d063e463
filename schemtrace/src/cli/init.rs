use anyhow::bail;
use colored::Colorize;
use schemtrace::config::GraphConfig;
use std::path::Path;

pub fn run(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    GraphConfig::default().save(path)?;

    println!("{} Created default config at: {}", "✓".green(), path.display());
    println!("\nSet scaling_factor to your scale estimate, or pass --scale per run.");
    Ok(())
}

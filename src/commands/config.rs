use colored::*;
use eyre::Result;
use std::path::Path;

use super::print_structured;
use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config, anchor: &Path) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config, anchor),
    }
}

fn show(format: OutputFormat, config: &Config, anchor: &Path) -> Result<()> {
    if print_structured(format, config)? {
        return Ok(());
    }

    println!("{}", "CADE Configuration".bold());
    println!();
    println!(
        "  root: {}",
        config
            .root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(unset)".dimmed().to_string())
    );
    println!("  effective root: {}", anchor.display());
    println!("  memory_dir: {}", config.memory_dir(anchor).display());
    println!("  log_level: {}", config.log_level.as_filter());

    Ok(())
}

//! System status command
//!
//! Shows what the core loaded, the memory store and registered components.

use colored::*;
use eyre::Result;
use serde::Serialize;
use std::path::Path;

use super::print_structured;
use crate::cli::OutputFormat;
use crate::component::{ComponentStatus, builtin};
use crate::documents::{AutoInitConfig, CadeCore, CoreStatus};
use crate::loader::{PathsSource, Resolver};
use crate::memory::{MemoryStatus, MemoryStore};

#[derive(Serialize)]
struct Status {
    version: String,
    root: String,
    paths_source: PathsSource,
    core: CoreStatus,
    auto_init: AutoInitConfig,
    memory: MemoryStatus,
    components: Vec<ComponentStatus>,
}

pub fn run(format: OutputFormat, resolver: &Resolver, memory_dir: &Path) -> Result<()> {
    let core = CadeCore::load(resolver);
    let memory = MemoryStore::open(memory_dir.to_path_buf())?;
    let mut registry = builtin::registry(&core, Some(&memory))?;

    let status = Status {
        version: env!("CARGO_PKG_VERSION").to_string(),
        root: resolver.paths().root.display().to_string(),
        paths_source: resolver.paths().source,
        core: core.status(),
        auto_init: core.auto_init(),
        memory: memory.status(),
        components: registry.status(),
    };
    registry.cleanup_all();

    if !print_structured(format, &status)? {
        print_text_status(&status);
    }

    Ok(())
}

fn flag(loaded: bool) -> ColoredString {
    if loaded { "✓".green() } else { "✗".red() }
}

fn print_text_status(status: &Status) {
    println!("{}", "CADE Status".bold());
    println!();

    println!("  {:14} {}", "Version:".dimmed(), status.version);
    println!("  {:14} {}", "Root:".dimmed(), status.root);
    println!(
        "  {:14} {}",
        "Paths from:".dimmed(),
        format!("{:?}", status.paths_source).to_lowercase()
    );
    println!();

    let core = &status.core;
    let state = if core.initialized {
        "initialized".green()
    } else {
        "degraded".yellow()
    };
    println!("{} ({}):", "Core".cyan(), state);
    println!("  {} identity", flag(core.identity_loaded));
    println!("  {} directives", flag(core.directives_loaded));
    println!("  {} knowledge", flag(core.knowledge_loaded));
    println!("  {} manifest", flag(core.manifest_loaded));
    println!("  {} health history", flag(core.health_history_loaded));
    if !core.config_sections.is_empty() {
        println!("  {:14} {}", "Config:".dimmed(), core.config_sections.join(", "));
    }
    println!("  {:14} {}", "Absorb file:".dimmed(), status.auto_init.file);
    println!("  {:14} {}", "Directive:".dimmed(), status.auto_init.directive);
    for failure in &core.failures {
        println!("  {} {}", "⚠".yellow(), failure.dimmed());
    }
    println!();

    println!("{}:", "Memory".cyan());
    println!("  {:14} {}", "Directory:".dimmed(), status.memory.memory_dir);
    println!("  {:14} {}", "Turns:".dimmed(), status.memory.conversation_count);
    println!("  {:14} {}", "Context keys:".dimmed(), status.memory.context_size);
    println!();

    println!(
        "{} ({}):",
        "Components".cyan(),
        format!("{} registered", status.components.len()).dimmed()
    );
    for component in &status.components {
        println!(
            "  {} {} {} {}",
            "•".cyan(),
            component.name,
            format!("v{}", component.version).dimmed(),
            format!("[{}]", component.kind).dimmed()
        );
    }
}

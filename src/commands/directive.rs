use colored::*;
use eyre::Result;
use serde_json::Value;
use std::path::Path;

use super::{parse_pairs, print_structured};
use crate::cli::{DirectiveAction, OutputFormat};
use crate::component::{Registry, builtin};
use crate::documents::CadeCore;
use crate::loader::Resolver;
use crate::memory::MemoryStore;

pub fn run(action: DirectiveAction, resolver: &Resolver, memory_dir: &Path) -> Result<()> {
    let core = CadeCore::load(resolver);
    let memory = MemoryStore::open(memory_dir.to_path_buf())?;
    let mut registry = builtin::registry(&core, Some(&memory))?;

    let result = match action {
        DirectiveAction::List { format } => list(&registry, OutputFormat::resolve(format)),
        DirectiveAction::Run { name, args } => execute(&registry, &name, &args),
    };

    registry.cleanup_all();
    result
}

fn list(registry: &Registry, format: OutputFormat) -> Result<()> {
    let status = registry.status();
    if print_structured(format, &status)? {
        return Ok(());
    }

    if registry.is_empty() {
        println!("  {}", "(no components registered)".dimmed());
        return Ok(());
    }

    println!("{} ({} registered)", "Components".cyan(), registry.len());
    for component in &status {
        let description = registry.get(&component.name).map(|c| c.info().description.clone()).unwrap_or_default();
        println!(
            "  {} {:10} {:10} {}",
            "•".cyan(),
            component.name,
            component.kind.to_string().dimmed(),
            description
        );
    }
    Ok(())
}

fn execute(registry: &Registry, name: &str, args: &[String]) -> Result<()> {
    let args = Value::Object(parse_pairs(args)?);
    let result = registry.execute(name, &args);

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        eyre::bail!("Directive '{}' failed: {}", name, result.message);
    }
    Ok(())
}

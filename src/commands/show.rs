//! Print loaded documents

use eyre::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::cli::DocumentKind;
use crate::documents::CadeCore;
use crate::loader::{DecodePolicy, Resolver};

pub fn run(name: &str, kind: Option<DocumentKind>, errors: DecodePolicy, resolver: &Resolver) -> Result<()> {
    let kind = kind.unwrap_or_else(|| infer_kind(name));
    log::debug!("Showing '{}' as {:?}", name, kind);

    match kind {
        DocumentKind::Json => {
            let value = resolver
                .load_json(name)
                .with_context(|| format!("Failed to load {}", name))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        DocumentKind::Ini => {
            let ini = resolver
                .load_ini(name)
                .with_context(|| format!("Failed to load {}", name))?;
            println!("{}", serde_json::to_string_pretty(&ini.to_json())?);
        }
        DocumentKind::Text => {
            let text = resolver
                .load_text(name, errors)
                .with_context(|| format!("Failed to load {}", name))?;
            print!("{}", text);
        }
    }

    Ok(())
}

pub fn identity(resolver: &Resolver) -> Result<()> {
    let core = load_core(resolver);
    print_section(&core.identity())
}

pub fn directives(resolver: &Resolver) -> Result<()> {
    let core = load_core(resolver);
    print_section(&core.directives())
}

pub fn resurrection(resolver: &Resolver) -> Result<()> {
    let core = load_core(resolver);
    print_section(&core.resurrection_protocol())
}

fn load_core(resolver: &Resolver) -> CadeCore {
    let core = CadeCore::load(resolver);
    for failure in &core.failures {
        eprintln!("warning: {}: {}", failure.reference, failure.error);
    }
    core
}

fn print_section(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn infer_kind(name: &str) -> DocumentKind {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentKind::Json,
        Some(ext) if ext.eq_ignore_ascii_case("ini") || ext.eq_ignore_ascii_case("cfg") => DocumentKind::Ini,
        _ => DocumentKind::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kind() {
        assert_eq!(infer_kind("cade_persona.json"), DocumentKind::Json);
        assert_eq!(infer_kind("json/Manifest.JSON"), DocumentKind::Json);
        assert_eq!(infer_kind("auto_init_cade.ini"), DocumentKind::Ini);
        assert_eq!(infer_kind("cade_resurrect.md"), DocumentKind::Text);
        assert_eq!(infer_kind("README"), DocumentKind::Text);
    }
}

//! Initialize a CADE repository root

use colored::*;
use eyre::{Context, Result};
use serde_json::{Map, Value};
use std::fs;

use crate::documents::{DEFAULT_INIT_CONFIG, INIT_CONFIG_FILE};
use crate::loader::paths::MANIFEST_FILE;
use crate::loader::{PathRole, PathsSource, Resolver};

/// Directories every CADE root needs
const REQUIRED_DIRS: [&str; 2] = ["json", "logs"];

pub fn run(force: bool, resolver: &mut Resolver) -> Result<()> {
    let root = resolver.paths().root.clone();

    println!("{} Initializing CADE in {}", "→".blue(), root.display());

    for dir in REQUIRED_DIRS {
        let dir_path = root.join(dir);
        if dir_path.is_dir() {
            println!("  {} {}/ exists", "✓".green(), dir);
        } else {
            fs::create_dir_all(&dir_path).context(format!("Failed to create {}", dir))?;
            println!("  {} Created {}/", "✓".green(), dir);
        }
    }

    // Never overwritten, not even with --force
    let manifest_path = resolver.anchor().join(MANIFEST_FILE);
    if manifest_path.exists() {
        println!("  {} {} already exists", "✓".green(), MANIFEST_FILE);
    } else {
        if let Some(parent) = manifest_path.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&manifest_path, default_manifest()?).context(format!("Failed to write {}", MANIFEST_FILE))?;
        resolver.invalidate();
        println!("  {} Created {}", "✓".green(), MANIFEST_FILE);
    }
    if resolver.paths().source == PathsSource::Defaults {
        println!("  {} {} is unusable, built-in paths apply", "⚠".yellow(), MANIFEST_FILE);
    }

    let config_path = root.join(INIT_CONFIG_FILE);
    if config_path.exists() && !force {
        println!("  {} {} already exists", "✓".green(), INIT_CONFIG_FILE);
        println!("  Use {} to overwrite", "--force".cyan());
    } else {
        fs::write(&config_path, DEFAULT_INIT_CONFIG).context(format!("Failed to write {}", INIT_CONFIG_FILE))?;
        println!("  {} Created {}", "✓".green(), INIT_CONFIG_FILE);
    }

    // The config must read back cleanly, whoever wrote it
    let ini = resolver
        .load_ini(INIT_CONFIG_FILE)
        .context(format!("{} is not valid INI", INIT_CONFIG_FILE))?;
    let sections: Vec<&str> = ini.sections().collect();
    println!("  {} Config sections: {}", "✓".green(), sections.join(", "));

    println!();
    println!("{} CADE initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Put the persona and knowledge files under {}", "json/".cyan());
    println!("  2. Run {} to verify setup", "cade check".cyan());

    Ok(())
}

/// Path manifest spelling out the built-in directory table
fn default_manifest() -> Result<String> {
    let entries: Map<String, Value> = PathRole::ALL
        .iter()
        .map(|role| (role.key().to_string(), Value::String(role.default_relative().to_string())))
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_layout() {
        let temp = TempDir::new().unwrap();
        let mut resolver = Resolver::new(temp.path());

        run(false, &mut resolver).unwrap();

        assert!(temp.path().join("json").is_dir());
        assert!(temp.path().join("logs").is_dir());
        let written = fs::read_to_string(temp.path().join(INIT_CONFIG_FILE)).unwrap();
        assert_eq!(written, DEFAULT_INIT_CONFIG);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(INIT_CONFIG_FILE), "[custom]\nx = 1\n").unwrap();
        let mut resolver = Resolver::new(temp.path());

        run(false, &mut resolver).unwrap();
        let kept = fs::read_to_string(temp.path().join(INIT_CONFIG_FILE)).unwrap();
        assert_eq!(kept, "[custom]\nx = 1\n");

        run(true, &mut resolver).unwrap();
        let replaced = fs::read_to_string(temp.path().join(INIT_CONFIG_FILE)).unwrap();
        assert_eq!(replaced, DEFAULT_INIT_CONFIG);
    }

    #[test]
    fn test_init_rejects_broken_existing_config() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(INIT_CONFIG_FILE), "no section = here\n").unwrap();
        let mut resolver = Resolver::new(temp.path());

        assert!(run(false, &mut resolver).is_err());
    }

    #[test]
    fn test_init_writes_manifest_and_reloads_paths() {
        let temp = TempDir::new().unwrap();
        let mut resolver = Resolver::new(temp.path());
        assert_eq!(resolver.paths().source, PathsSource::Defaults);

        run(false, &mut resolver).unwrap();

        assert_eq!(resolver.paths().source, PathsSource::Manifest);
        assert_eq!(resolver.paths().scripts, temp.path().join("other"));
        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["json"], "json");
        assert_eq!(manifest["docs"], ".");
    }

    #[test]
    fn test_init_keeps_existing_manifest() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("json")).unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), r#"{"json": "data"}"#).unwrap();
        let mut resolver = Resolver::new(temp.path());

        run(true, &mut resolver).unwrap();

        let kept = fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(kept, r#"{"json": "data"}"#);
        assert_eq!(resolver.paths().json, temp.path().join("data"));
    }
}

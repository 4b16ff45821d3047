//! Verify a CADE root: required files present and parseable

use colored::*;
use eyre::Result;
use serde::Serialize;

use super::print_structured;
use crate::cli::OutputFormat;
use crate::documents::{INIT_CONFIG_FILE, KNOWLEDGE_FILE, MANIFEST_FILE, PERSONA_FILE};
use crate::loader::{LoadError, PathsSource, Resolver};

const REQUIRED_FILES: [&str; 4] = [PERSONA_FILE, KNOWLEDGE_FILE, MANIFEST_FILE, INIT_CONFIG_FILE];

#[derive(Debug, Serialize)]
struct CheckReport {
    root: String,
    manifest: PathsSource,
    files: Vec<FileCheck>,
    config_sections: Vec<String>,
    ok: bool,
}

#[derive(Debug, Serialize)]
struct FileCheck {
    name: String,
    path: String,
    exists: bool,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(format: OutputFormat, resolver: &Resolver) -> Result<()> {
    let report = gather(resolver);

    if !print_structured(format, &report)? {
        print_text_report(&report);
    }

    if !report.ok {
        let failed = report.files.iter().filter(|f| !f.valid).count();
        eyre::bail!("{} required file(s) missing or invalid", failed);
    }

    Ok(())
}

fn gather(resolver: &Resolver) -> CheckReport {
    let paths = resolver.paths();
    let mut config_sections = Vec::new();

    let files: Vec<FileCheck> = REQUIRED_FILES
        .iter()
        .map(|name| {
            let path = resolver.resolve(name);
            let exists = path.is_file();

            let outcome: Result<(), LoadError> = if !exists {
                Ok(())
            } else if name.ends_with(".ini") {
                resolver.load_ini(name).map(|ini| {
                    config_sections = ini.sections().map(String::from).collect();
                })
            } else {
                resolver.load_json(name).map(|_| ())
            };

            let error = match (&outcome, exists) {
                (Err(e), _) => Some(e.to_string()),
                (Ok(()), false) => Some("missing".to_string()),
                (Ok(()), true) => None,
            };

            FileCheck {
                name: name.to_string(),
                path: path.display().to_string(),
                exists,
                valid: error.is_none(),
                error,
            }
        })
        .collect();

    CheckReport {
        root: paths.root.display().to_string(),
        manifest: paths.source,
        ok: files.iter().all(|f| f.valid),
        files,
        config_sections,
    }
}

fn print_text_report(report: &CheckReport) {
    println!("{}", "CADE Check".bold());
    println!("{}", "═".repeat(50));
    println!();

    println!("  {:10} {}", "Root:".dimmed(), report.root);
    let manifest = match report.manifest {
        PathsSource::Manifest => "json/cade_paths.json".to_string(),
        PathsSource::Defaults => "defaults (no usable json/cade_paths.json)".to_string(),
    };
    println!("  {:10} {}", "Paths:".dimmed(), manifest);
    println!();

    println!("{}", "Required Files:".bold());
    for file in &report.files {
        if file.valid {
            println!("  {} {}", "✓".green(), file.name);
        } else {
            println!("  {} {}", "✗".red(), file.name);
            if let Some(error) = &file.error {
                println!("    {}", error.dimmed());
            }
        }
    }
    println!();

    println!("{}", "Configuration:".bold());
    if report.config_sections.is_empty() {
        println!("  {} No config sections", "⚠".yellow());
    } else {
        println!("  {} Sections: {}", "✓".green(), report.config_sections.join(", "));
    }
    println!();

    println!("{}", "═".repeat(50));
    if report.ok {
        println!("{} CADE is ready to use!", "✓".green().bold());
    } else {
        println!(
            "{} Initialization completed with errors. Check the report above.",
            "✗".red().bold()
        );
    }
}

use colored::*;
use eyre::Result;

use super::print_structured;
use crate::cli::OutputFormat;
use crate::loader::{PathRole, PathsSource, Resolver};

pub fn show(format: OutputFormat, resolver: &Resolver) -> Result<()> {
    let paths = resolver.paths();

    if print_structured(format, paths)? {
        return Ok(());
    }

    let source = match paths.source {
        PathsSource::Manifest => "manifest",
        PathsSource::Defaults => "defaults",
    };
    println!("{} ({})", "Paths".bold(), source.dimmed());
    for role in PathRole::ALL {
        let dir = paths.get(role);
        let marker = if dir.is_dir() { "✓".green() } else { "·".dimmed() };
        println!("  {} {:10} {}", marker, role.key(), dir.display());
    }

    Ok(())
}

pub fn resolve(names: &[String], resolver: &Resolver) -> Result<()> {
    for name in names {
        let path = resolver.resolve(name);
        if names.len() == 1 {
            println!("{}", path.display());
        } else {
            println!("{}\t{}", name, path.display());
        }
    }
    Ok(())
}

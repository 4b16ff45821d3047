//! Path manifest loading (json/cade_paths.json)
//!
//! The manifest maps the five logical directory roles to paths relative to
//! the anchor directory. Loading is all-or-nothing: any problem with the
//! manifest yields the full default table.

use eyre::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Manifest location, relative to the anchor
pub const MANIFEST_FILE: &str = "json/cade_paths.json";

/// Logical directory roles declared by the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathRole {
    Root,
    Json,
    Docs,
    Scripts,
    Starfield,
}

impl PathRole {
    pub const ALL: [PathRole; 5] = [
        PathRole::Root,
        PathRole::Json,
        PathRole::Docs,
        PathRole::Scripts,
        PathRole::Starfield,
    ];

    /// Key used in the manifest
    pub fn key(&self) -> &'static str {
        match self {
            PathRole::Root => "root",
            PathRole::Json => "json",
            PathRole::Docs => "docs",
            PathRole::Scripts => "scripts",
            PathRole::Starfield => "starfield",
        }
    }

    /// Relative path used when the manifest omits the key
    pub fn default_relative(&self) -> &'static str {
        match self {
            PathRole::Root => ".",
            PathRole::Json => "json",
            PathRole::Docs => ".",
            PathRole::Scripts => "other",
            PathRole::Starfield => "starfield",
        }
    }
}

impl std::fmt::Display for PathRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a path table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathsSource {
    Manifest,
    Defaults,
}

/// Resolved directory table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paths {
    pub root: PathBuf,
    pub json: PathBuf,
    pub docs: PathBuf,
    pub scripts: PathBuf,
    pub starfield: PathBuf,
    pub source: PathsSource,
}

impl Paths {
    /// Hardcoded table used whenever the manifest cannot be used
    pub fn defaults(anchor: &Path) -> Self {
        Self {
            root: anchor.to_path_buf(),
            json: anchor.join("json"),
            docs: anchor.to_path_buf(),
            scripts: anchor.join("other"),
            starfield: anchor.join("starfield"),
            source: PathsSource::Defaults,
        }
    }

    pub fn get(&self, role: PathRole) -> &Path {
        match role {
            PathRole::Root => &self.root,
            PathRole::Json => &self.json,
            PathRole::Docs => &self.docs,
            PathRole::Scripts => &self.scripts,
            PathRole::Starfield => &self.starfield,
        }
    }

    fn set(&mut self, role: PathRole, path: PathBuf) {
        match role {
            PathRole::Root => self.root = path,
            PathRole::Json => self.json = path,
            PathRole::Docs => self.docs = path,
            PathRole::Scripts => self.scripts = path,
            PathRole::Starfield => self.starfield = path,
        }
    }
}

/// Load the path table for an anchor directory, falling back to defaults
pub fn load_paths(anchor: &Path) -> Paths {
    let manifest_path = anchor.join(MANIFEST_FILE);

    match read_manifest(anchor, &manifest_path) {
        Ok(paths) => {
            log::debug!("Loaded path manifest from {}", manifest_path.display());
            paths
        }
        Err(e) => {
            if manifest_path.exists() {
                log::warn!("Ignoring path manifest {}: {:#}", manifest_path.display(), e);
            } else {
                log::debug!("No path manifest at {}, using defaults", manifest_path.display());
            }
            Paths::defaults(anchor)
        }
    }
}

fn read_manifest(anchor: &Path, manifest_path: &Path) -> Result<Paths> {
    let content = fs::read_to_string(manifest_path).context("Failed to read path manifest")?;
    let value: Value = serde_json::from_str(&content).context("Failed to parse path manifest")?;

    let Some(entries) = value.as_object() else {
        eyre::bail!("Path manifest must be a JSON object");
    };

    let mut paths = Paths::defaults(anchor);
    paths.source = PathsSource::Manifest;

    for role in PathRole::ALL {
        let relative = match entries.get(role.key()) {
            None => role.default_relative(),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => eyre::bail!("Entry '{}' must be a string, got {}", role, other),
        };
        paths.set(role, normalize(&anchor.join(relative)));
    }

    Ok(paths)
}

/// Lexically normalize a path: drop `.`, fold `..`, collapse separators.
/// Symlinks are not consulted.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the filesystem root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(segment) => out.push(segment),
        }
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

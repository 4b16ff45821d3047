//! Path resolution and document loading
//!
//! This module handles:
//! - Loading the path manifest once per resolver
//! - Mapping logical file references to absolute paths
//! - Loading resolved files as text, JSON, or INI
//!
//! Resolution order for a bare file name is `root`, `json`, `docs`,
//! `scripts`; the first existing candidate wins and the `json` candidate is
//! the fallback when none exists.

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub mod error;
pub mod ini;
pub mod paths;

pub use error::{LoadError, LoadResult};
pub use ini::Ini;
pub use paths::{PathRole, Paths, PathsSource};

/// Roles searched for bare file names, in priority order
const SEARCH_ORDER: [PathRole; 4] = [PathRole::Root, PathRole::Json, PathRole::Docs, PathRole::Scripts];

/// What to do with invalid UTF-8 when loading text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DecodePolicy {
    /// Fail on the first invalid sequence
    #[default]
    Strict,
    /// Substitute U+FFFD for each invalid sequence
    Replace,
    /// Drop invalid sequences
    Ignore,
}

/// Resolves logical file references against one anchor directory.
///
/// Build one at startup and pass it by reference; the path table is read
/// from the manifest on first use and reused until [`Resolver::invalidate`].
#[derive(Debug)]
pub struct Resolver {
    anchor: PathBuf,
    paths: OnceCell<Paths>,
}

impl Resolver {
    pub fn new(anchor: impl Into<PathBuf>) -> Self {
        Self {
            anchor: paths::normalize(&anchor.into()),
            paths: OnceCell::new(),
        }
    }

    pub fn anchor(&self) -> &Path {
        &self.anchor
    }

    /// The path table, loaded on first access
    pub fn paths(&self) -> &Paths {
        self.paths.get_or_init(|| paths::load_paths(&self.anchor))
    }

    /// Drop the cached path table so the manifest is re-read on next use
    pub fn invalidate(&mut self) {
        self.paths.take();
    }

    /// Map a logical file reference to an absolute path. Never fails.
    pub fn resolve(&self, name: &str) -> PathBuf {
        if Path::new(name).is_absolute() {
            return PathBuf::from(name);
        }

        let name = name
            .strip_prefix("root/")
            .or_else(|| name.strip_prefix("root\\"))
            .unwrap_or(name);

        let paths = self.paths();

        if name.contains(['/', '\\']) {
            return paths::normalize(&paths.root.join(name));
        }

        for role in SEARCH_ORDER {
            let candidate = paths.get(role).join(name);
            if candidate.exists() {
                log::trace!("Resolved '{}' via {} -> {}", name, role, candidate.display());
                return paths::normalize(&candidate);
            }
        }

        paths::normalize(&paths.json.join(name))
    }

    /// Resolve and read a file as UTF-8 under the given decode policy
    pub fn load_text(&self, name: &str, policy: DecodePolicy) -> LoadResult<String> {
        let path = self.resolve(name);
        let bytes = read_bytes(&path)?;
        decode(bytes, policy, &path)
    }

    /// Resolve and parse a JSON document
    pub fn load_json(&self, name: &str) -> LoadResult<Value> {
        self.load_json_as(name)
    }

    /// Resolve and deserialize a JSON document into a typed value
    pub fn load_json_as<T: DeserializeOwned>(&self, name: &str) -> LoadResult<T> {
        let path = self.resolve(name);
        let content = decode_document(read_bytes(&path)?, &path)?;
        let value = serde_json::from_str(&content).map_err(|e| LoadError::parse(path.clone(), e.to_string()))?;
        log::debug!("Loaded JSON '{}' from {}", name, path.display());
        Ok(value)
    }

    /// Resolve and parse an INI file. A missing file yields an empty document.
    pub fn load_ini(&self, name: &str) -> LoadResult<Ini> {
        let path = self.resolve(name);
        let bytes = match read_bytes(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                log::debug!("INI '{}' not found at {}, using empty config", name, path.display());
                return Ok(Ini::default());
            }
            Err(e) => return Err(e),
        };
        let content = decode_document(bytes, &path)?;
        let ini = Ini::parse(&content).map_err(|e| LoadError::parse(path.clone(), e.to_string()))?;
        log::debug!("Loaded INI '{}' from {} ({} sections)", name, path.display(), ini.len());
        Ok(ini)
    }
}

fn read_bytes(path: &Path) -> LoadResult<Vec<u8>> {
    fs::read(path).map_err(|e| LoadError::from_io(path.to_path_buf(), e))
}

fn decode(bytes: Vec<u8>, policy: DecodePolicy, path: &Path) -> LoadResult<String> {
    match policy {
        DecodePolicy::Strict => String::from_utf8(bytes).map_err(|e| LoadError::Decode {
            path: path.to_path_buf(),
            offset: e.utf8_error().valid_up_to(),
        }),
        DecodePolicy::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        DecodePolicy::Ignore => Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
    }
}

/// JSON and INI must be UTF-8; anything else is a malformed document
fn decode_document(bytes: Vec<u8>, path: &Path) -> LoadResult<String> {
    String::from_utf8(bytes).map_err(|e| {
        LoadError::parse(
            path.to_path_buf(),
            format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        )
    })
}

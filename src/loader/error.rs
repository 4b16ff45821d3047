//! Errors surfaced by the content loaders
//!
//! Manifest problems never show up here: they fall back to the default
//! path table inside [`super::paths`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid UTF-8 in {} at byte {offset}", path.display())]
    Decode { path: PathBuf, offset: usize },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    /// Map an I/O error, keeping not-found distinct from other failures
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound { path }
        } else {
            LoadError::Io { path, source }
        }
    }

    pub fn parse(path: PathBuf, message: impl Into<String>) -> Self {
        LoadError::Parse {
            path,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, LoadError::Parse { .. })
    }
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

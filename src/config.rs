use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main CADE configuration (cade.yaml)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Anchor directory; the path manifest and documents live under it
    pub root: Option<PathBuf>,
    /// Conversation/context store; relative paths are under the anchor
    pub memory_dir: PathBuf,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            memory_dir: PathBuf::from("memory"),
            log_level: LogLevel::default(),
        }
    }
}

/// Log lines produced while loading, replayed once logging is set up
pub type LoadNotes = Vec<(log::Level, String)>;

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Runs before the logger exists, so what would be logged comes back
    /// as notes for the caller to emit.
    pub fn load(config_path: Option<&PathBuf>) -> Result<(Self, LoadNotes)> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            let config =
                Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            let notes = vec![(log::Level::Info, format!("Loaded config from: {}", path.display()))];
            return Ok((config, notes));
        }

        let mut candidates: Vec<(PathBuf, &str)> = Vec::new();
        if let Ok(env_path) = std::env::var("CADE_CONFIG") {
            candidates.push((PathBuf::from(env_path), "CADE_CONFIG"));
        }
        if let Ok(cade_root) = std::env::var("CADE_ROOT") {
            candidates.push((PathBuf::from(cade_root).join("cade.yaml"), "CADE_ROOT"));
        }
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push((config_dir.join("cade").join("cade.yaml"), "user config"));
        }
        // ./cade.yaml for development
        candidates.push((PathBuf::from("cade.yaml"), "local config"));

        Ok(Self::load_first(&candidates))
    }

    /// First candidate that exists and parses; broken files are noted and skipped
    fn load_first(candidates: &[(PathBuf, &str)]) -> (Self, LoadNotes) {
        let mut notes = LoadNotes::new();

        for (path, origin) in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(path) {
                Ok(config) => {
                    notes.push((log::Level::Info, format!("Loaded config from: {} ({})", path.display(), origin)));
                    return (config, notes);
                }
                Err(e) => notes.push((
                    log::Level::Warn,
                    format!("Failed to load config from {} ({}): {:#}", path.display(), origin, e),
                )),
            }
        }

        notes.push((log::Level::Info, "No config file found, using defaults".to_string()));
        (Self::default(), notes)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Anchor from the environment: CADE_ROOT, else the current directory
    pub fn cade_root() -> PathBuf {
        std::env::var("CADE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Effective anchor directory, absolute.
    /// Precedence: command-line override, config `root`, CADE_ROOT, cwd.
    pub fn anchor(&self, cli_root: Option<&Path>) -> Result<PathBuf> {
        let chosen = cli_root
            .map(Path::to_path_buf)
            .or_else(|| self.root.clone())
            .unwrap_or_else(Self::cade_root);

        std::path::absolute(Self::expand_path(&chosen))
            .with_context(|| format!("Failed to make root absolute: {}", chosen.display()))
    }

    /// Memory directory, resolved against the anchor when relative
    pub fn memory_dir(&self, anchor: &Path) -> PathBuf {
        let expanded = Self::expand_path(&self.memory_dir);
        if expanded.is_absolute() {
            expanded
        } else {
            anchor.join(expanded)
        }
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.root.is_none());
        assert_eq!(config.memory_dir, PathBuf::from("memory"));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_expand_path_no_expansion() {
        let path = PathBuf::from("/usr/local/bin");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = Config::expand_path(&path);
        // Should expand ~ to home directory
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("test"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        // SAFETY: Test runs single-threaded, env var is test-specific
        unsafe {
            std::env::set_var("CADE_TEST_VAR", "/custom/path");
        }
        let path = PathBuf::from("$CADE_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/custom/path/subdir"));
        unsafe {
            std::env::remove_var("CADE_TEST_VAR");
        }
    }

    #[test]
    fn test_anchor_prefers_cli_override() {
        let config = Config {
            root: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        let anchor = config.anchor(Some(Path::new("/from/cli"))).unwrap();
        assert_eq!(anchor, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_anchor_from_config_root() {
        let config = Config {
            root: Some(PathBuf::from("/from/config")),
            ..Config::default()
        };
        assert_eq!(config.anchor(None).unwrap(), PathBuf::from("/from/config"));
    }

    #[test]
    fn test_anchor_is_absolute() {
        let config = Config {
            root: Some(PathBuf::from("relative/repo")),
            ..Config::default()
        };
        let anchor = config.anchor(None).unwrap();
        assert!(anchor.is_absolute());
        assert!(anchor.ends_with("relative/repo"));
    }

    #[test]
    fn test_memory_dir_relative_to_anchor() {
        let config = Config::default();
        assert_eq!(config.memory_dir(Path::new("/repo")), PathBuf::from("/repo/memory"));

        let config = Config {
            memory_dir: PathBuf::from("/var/cade/memory"),
            ..Config::default()
        };
        assert_eq!(config.memory_dir(Path::new("/repo")), PathBuf::from("/var/cade/memory"));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cade.yaml");
        fs::write(&path, "root: /srv/cade\nlog_level: debug\n").unwrap();

        let (config, notes) = Config::load(Some(&path)).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("/srv/cade")));
        assert_eq!(notes[0].0, log::Level::Info);
        assert_eq!(config.log_level, LogLevel::Debug);
        // unspecified fields keep defaults
        assert_eq!(config.memory_dir, PathBuf::from("memory"));
    }

    #[test]
    fn test_explicit_config_errors_are_fatal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cade.yaml");
        fs::write(&path, "log_level: [not, a, level]\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_broken_candidate_is_noted_and_skipped() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("broken.yaml");
        let good = temp.path().join("cade.yaml");
        fs::write(&broken, "log_level: [not, a, level]\n").unwrap();
        fs::write(&good, "log_level: warn\n").unwrap();
        let candidates = vec![
            (temp.path().join("absent.yaml"), "missing"),
            (broken.clone(), "CADE_CONFIG"),
            (good, "user config"),
        ];

        let (config, notes) = Config::load_first(&candidates);

        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].0, log::Level::Warn);
        assert!(notes[0].1.contains(&broken.display().to_string()));
        assert!(notes[0].1.contains("CADE_CONFIG"));
        assert_eq!(notes[1].0, log::Level::Info);
    }

    #[test]
    fn test_no_candidates_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let (config, notes) = Config::load_first(&[(temp.path().join("absent.yaml"), "local config")]);

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(notes, vec![(log::Level::Info, "No config file found, using defaults".to_string())]);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config {
            root: Some(PathBuf::from("/srv/cade")),
            ..Config::default()
        };
        let yaml_str = serde_yaml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = serde_yaml::from_str(&yaml_str).expect("Failed to deserialize");
        assert_eq!(parsed.root, config.root);
        assert_eq!(parsed.log_level, config.log_level);
    }
}

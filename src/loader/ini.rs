//! INI parsing
//!
//! # Format
//!
//! ```ini
//! [auto_init_absorb]
//! file = cade_resurrect.md
//! directive: respond with name and directive
//!
//! ; comment
//! [paths]
//! knowledge_base = json/
//!     continued on the next line
//! ```
//!
//! Section names keep their case; keys are lowercased. `[DEFAULT]` entries
//! are visible from every section through [`Ini::get`]. A blank line ends a
//! multi-line value.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_SECTION: &str = "DEFAULT";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct IniError {
    pub line: usize,
    pub message: String,
}

impl IniError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

pub type Section = IndexMap<String, String>;

/// Parsed INI document, section and key order preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ini {
    defaults: Section,
    sections: IndexMap<String, Section>,
}

impl Ini {
    pub fn parse(content: &str) -> Result<Self, IniError> {
        let mut ini = Ini::default();
        // None until the first header; Some(DEFAULT_SECTION) targets `defaults`
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw.starts_with([' ', '\t']);
            if indented && let (Some(section), Some(key)) = (current.as_deref(), last_key.as_deref()) {
                if let Some(value) = ini.section_mut(section).get_mut(key) {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                }
                continue;
            }

            if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                let name = inner.trim();
                if name.is_empty() {
                    return Err(IniError::new(line_no, "empty section name"));
                }
                if name != DEFAULT_SECTION {
                    if ini.sections.contains_key(name) {
                        return Err(IniError::new(line_no, format!("duplicate section '{}'", name)));
                    }
                    ini.sections.insert(name.to_string(), Section::new());
                }
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let Some(section) = current.as_deref() else {
                return Err(IniError::new(line_no, "key/value pair before any section header"));
            };

            let Some(pos) = trimmed.find(['=', ':']) else {
                return Err(IniError::new(line_no, format!("expected 'key = value', got '{}'", trimmed)));
            };

            let key = trimmed[..pos].trim().to_lowercase();
            if key.is_empty() {
                return Err(IniError::new(line_no, "empty key"));
            }
            let value = trimmed[pos + 1..].trim().to_string();

            let entries = ini.section_mut(section);
            if entries.contains_key(&key) {
                return Err(IniError::new(
                    line_no,
                    format!("duplicate key '{}' in section '{}'", key, section),
                ));
            }
            entries.insert(key.clone(), value);
            last_key = Some(key);
        }

        Ok(ini)
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        if name == DEFAULT_SECTION {
            &mut self.defaults
        } else {
            self.sections.entry(name.to_string()).or_default()
        }
    }

    /// Section names, excluding DEFAULT
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        if name == DEFAULT_SECTION {
            Some(&self.defaults)
        } else {
            self.sections.get(name)
        }
    }

    /// Look up a key in a section, falling back to DEFAULT
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        let entries = self.section(section)?;
        entries
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key).unwrap_or(default)
    }

    /// Number of sections, excluding DEFAULT
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when there are no sections besides DEFAULT, matching [`Ini::len`]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render as a JSON object of section -> {key: value}
    pub fn to_json(&self) -> Value {
        let to_object = |section: &Section| {
            Value::Object(
                section
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<String, Value>>(),
            )
        };

        let mut out = Map::new();
        if !self.defaults.is_empty() {
            out.insert(DEFAULT_SECTION.to_string(), to_object(&self.defaults));
        }
        for (name, section) in &self.sections {
            out.insert(name.clone(), to_object(section));
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[auto_init_absorb]
file = cade_resurrect.md
Directive: respond with name and directive

; system tuning
[system]
log_level = INFO
max_memory_mb = 2048

# paths
[paths]
knowledge_base = json/
notes = first line
    second line
"#;

    #[test]
    fn test_parse_sections_in_order() {
        let ini = Ini::parse(SAMPLE).unwrap();
        let sections: Vec<&str> = ini.sections().collect();
        assert_eq!(sections, vec!["auto_init_absorb", "system", "paths"]);
        assert_eq!(ini.len(), 3);
    }

    #[test]
    fn test_keys_are_lowercased() {
        let ini = Ini::parse(SAMPLE).unwrap();
        assert_eq!(
            ini.get("auto_init_absorb", "directive"),
            Some("respond with name and directive")
        );
        assert_eq!(
            ini.get("auto_init_absorb", "DIRECTIVE"),
            Some("respond with name and directive")
        );
    }

    #[test]
    fn test_section_names_are_case_sensitive() {
        let ini = Ini::parse(SAMPLE).unwrap();
        assert!(ini.section("system").is_some());
        assert!(ini.section("System").is_none());
        assert_eq!(ini.get("System", "log_level"), None);
    }

    #[test]
    fn test_continuation_lines() {
        let ini = Ini::parse(SAMPLE).unwrap();
        assert_eq!(ini.get("paths", "notes"), Some("first line\nsecond line"));
    }

    #[test]
    fn test_default_section_fallback() {
        let ini = Ini::parse("[DEFAULT]\nowner = cade\n\n[a]\nx = 1\n").unwrap();
        assert_eq!(ini.get("a", "owner"), Some("cade"));
        assert_eq!(ini.get("a", "x"), Some("1"));
        assert_eq!(ini.len(), 1);
        assert!(!ini.sections().any(|name| name == DEFAULT_SECTION));
    }

    #[test]
    fn test_default_only_counts_as_empty() {
        let ini = Ini::parse("[DEFAULT]
owner = cade
").unwrap();
        assert_eq!(ini.len(), 0);
        assert!(ini.is_empty());
        assert_eq!(ini.section(DEFAULT_SECTION).unwrap()["owner"], "cade");
    }

    #[test]
    fn test_empty_input() {
        let ini = Ini::parse("").unwrap();
        assert!(ini.is_empty());
        assert_eq!(ini.len(), 0);
    }

    #[test]
    fn test_missing_section_header() {
        let err = Ini::parse("file = x\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_line_without_delimiter() {
        let err = Ini::parse("[a]\njust words\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let err = Ini::parse("[a]\nx = 1\n[a]\ny = 2\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("duplicate section"));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = Ini::parse("[a]\nx = 1\nX = 2\n").unwrap_err();
        assert!(err.message.contains("duplicate key"));
    }

    #[test]
    fn test_value_may_contain_delimiters() {
        let ini = Ini::parse("[db]\nurl = sqlite:///data/cade.db\n").unwrap();
        assert_eq!(ini.get("db", "url"), Some("sqlite:///data/cade.db"));
    }

    #[test]
    fn test_to_json() {
        let ini = Ini::parse("[a]\nx = 1\n").unwrap();
        assert_eq!(ini.to_json(), serde_json::json!({"a": {"x": "1"}}));
    }
}

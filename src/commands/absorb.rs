//! Load every core document and report what was absorbed
//!
//! Only the shape of each document is printed (top-level keys or length),
//! never its contents.

use colored::*;
use eyre::Result;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::print_structured;
use crate::cli::OutputFormat;
use crate::loader::Resolver;

pub const CORE_FILES: [&str; 5] = [
    "root/json/cade_persona.json",
    "root/json/cade_knowledgebases.json",
    "root/json/cade_manifest.json",
    "root/json/dawid_health_history.json",
    "root/json/.cspell.json",
];

/// How many top-level keys to preview
const KEY_PREVIEW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentSummary {
    Object { keys: Vec<String> },
    List { len: usize },
    Str,
    Int,
    Float,
    Bool,
    Null,
}

impl DocumentSummary {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(map) => DocumentSummary::Object {
                keys: map.keys().take(KEY_PREVIEW).cloned().collect(),
            },
            Value::Array(items) => DocumentSummary::List { len: items.len() },
            Value::String(_) => DocumentSummary::Str,
            Value::Number(n) if n.is_f64() => DocumentSummary::Float,
            Value::Number(_) => DocumentSummary::Int,
            Value::Bool(_) => DocumentSummary::Bool,
            Value::Null => DocumentSummary::Null,
        }
    }
}

#[derive(Debug, Serialize)]
struct AbsorbReport {
    status: &'static str,
    loaded_files: IndexMap<String, DocumentSummary>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    errors: IndexMap<String, String>,
}

pub fn run(format: OutputFormat, resolver: &Resolver) -> Result<()> {
    let report = absorb(resolver);

    if !print_structured(format, &report)? {
        print_text_report(&report);
    }

    if !report.errors.is_empty() {
        eyre::bail!("{} core file(s) could not be loaded", report.errors.len());
    }
    Ok(())
}

fn absorb(resolver: &Resolver) -> AbsorbReport {
    let mut loaded_files = IndexMap::new();
    let mut errors = IndexMap::new();

    for name in CORE_FILES {
        match resolver.load_json(name) {
            Ok(value) => {
                loaded_files.insert(name.to_string(), DocumentSummary::of(&value));
            }
            Err(e) => {
                log::error!("Failed to absorb {}: {}", name, e);
                errors.insert(name.to_string(), e.to_string());
            }
        }
    }

    AbsorbReport {
        status: if errors.is_empty() { "ok" } else { "error" },
        loaded_files,
        errors,
    }
}

fn print_text_report(report: &AbsorbReport) {
    println!("{}", "CADE Absorb".bold());
    println!();

    for (name, summary) in &report.loaded_files {
        let shape = match summary {
            DocumentSummary::Object { keys } => format!("object [{}]", keys.join(", ")),
            DocumentSummary::List { len } => format!("list ({} items)", len),
            other => format!("{:?}", other).to_lowercase(),
        };
        println!("  {} {} {}", "✓".green(), name, shape.dimmed());
    }
    for (name, error) in &report.errors {
        println!("  {} {}", "✗".red(), name);
        println!("    {}", error.dimmed());
    }

    println!();
    if report.errors.is_empty() {
        println!("{} All core files absorbed", "✓".green().bold());
    } else {
        println!("{} {} file(s) failed", "✗".red().bold(), report.errors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_summary_shapes() {
        assert_eq!(
            DocumentSummary::of(&json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6})),
            DocumentSummary::Object {
                keys: vec!["a", "b", "c", "d", "e"].into_iter().map(String::from).collect()
            }
        );
        assert_eq!(DocumentSummary::of(&json!([1, 2])), DocumentSummary::List { len: 2 });
        assert_eq!(DocumentSummary::of(&json!("x")), DocumentSummary::Str);
        assert_eq!(DocumentSummary::of(&json!(3)), DocumentSummary::Int);
        assert_eq!(DocumentSummary::of(&json!(3.5)), DocumentSummary::Float);
        assert_eq!(DocumentSummary::of(&json!(null)), DocumentSummary::Null);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = serde_json::to_value(DocumentSummary::List { len: 4 }).unwrap();
        assert_eq!(summary, json!({"type": "list", "len": 4}));
        let summary = serde_json::to_value(DocumentSummary::Object { keys: vec!["id".into()] }).unwrap();
        assert_eq!(summary, json!({"type": "object", "keys": ["id"]}));
    }

    #[test]
    fn test_absorb_all_present() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("json")).unwrap();
        for name in CORE_FILES {
            let relative = name.strip_prefix("root/").unwrap();
            fs::write(temp.path().join(relative), r#"{"version": "0.2"}"#).unwrap();
        }
        fs::write(temp.path().join("json").join(".cspell.json"), r#"["cade"]"#).unwrap();

        let report = absorb(&Resolver::new(temp.path()));
        assert_eq!(report.status, "ok");
        assert_eq!(report.loaded_files.len(), 5);
        assert_eq!(
            report.loaded_files["root/json/.cspell.json"],
            DocumentSummary::List { len: 1 }
        );
    }

    #[test]
    fn test_absorb_reports_missing() {
        let temp = TempDir::new().unwrap();
        let report = absorb(&Resolver::new(temp.path()));

        assert_eq!(report.status, "error");
        assert!(report.loaded_files.is_empty());
        assert_eq!(report.errors.len(), 5);
    }
}

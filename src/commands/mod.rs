use eyre::Result;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;

pub mod absorb;
pub mod check;
pub mod completions;
pub mod config;
pub mod directive;
pub mod init;
pub mod memory;
pub mod paths;
pub mod show;
pub mod status;

/// Print a value as JSON or YAML; `Text` is left to the caller
pub fn print_structured<T: Serialize>(format: OutputFormat, value: &T) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Text => return Ok(false),
    }
    Ok(true)
}

/// Parse a CLI value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse `key=value` pairs into a JSON object
pub fn parse_pairs(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            eyre::bail!("Expected KEY=VALUE, got '{}'", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            eyre::bail!("Empty key in '{}'", pair);
        }
        map.insert(key.to_string(), parse_value(value));
    }
    Ok(map)
}

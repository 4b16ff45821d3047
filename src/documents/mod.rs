//! Core document set
//!
//! Loads the persona, knowledge base, manifest, health history and init
//! config through a [`Resolver`]. Every document is loaded on its own; a
//! failure leaves that document empty and is recorded, so the returned
//! value is always usable in degraded mode.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::loader::{Ini, LoadError, Resolver};

pub const PERSONA_FILE: &str = "json/cade_persona.json";
pub const KNOWLEDGE_FILE: &str = "json/cade_knowledgebases.json";
pub const MANIFEST_FILE: &str = "json/cade_manifest.json";
pub const HEALTH_HISTORY_FILE: &str = "json/dawid_health_history.json";
pub const INIT_CONFIG_FILE: &str = "auto_init_cade.ini";

/// Section of the init config read at startup
pub const AUTO_INIT_SECTION: &str = "auto_init_absorb";

/// Default contents written by `cade init`
pub const DEFAULT_INIT_CONFIG: &str = r#"[auto_init_absorb]
file = cade_resurrect.md
directive = respond with name and directive

[system]
log_level = INFO
max_memory_mb = 2048

[paths]
knowledge_base = json/
logs = logs/
"#;

/// The `auto_init_absorb` section with its defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoInitConfig {
    pub file: String,
    pub directive: String,
}

impl Default for AutoInitConfig {
    fn default() -> Self {
        Self {
            file: "cade_resurrect.md".to_string(),
            directive: "respond with name and directive".to_string(),
        }
    }
}

impl AutoInitConfig {
    pub fn from_ini(ini: &Ini) -> Self {
        let defaults = Self::default();
        Self {
            file: ini.get_or(AUTO_INIT_SECTION, "file", &defaults.file).to_string(),
            directive: ini
                .get_or(AUTO_INIT_SECTION, "directive", &defaults.directive)
                .to_string(),
        }
    }
}

/// A document that failed to load
#[derive(Debug)]
pub struct DocumentFailure {
    pub reference: &'static str,
    pub error: LoadError,
}

/// Loaded CADE documents
#[derive(Debug, Default)]
pub struct CadeCore {
    pub persona: Value,
    pub knowledge: Value,
    pub manifest: Value,
    pub health_history: Value,
    pub config: Ini,
    pub failures: Vec<DocumentFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoreStatus {
    pub initialized: bool,
    pub identity_loaded: bool,
    pub directives_loaded: bool,
    pub knowledge_loaded: bool,
    pub manifest_loaded: bool,
    pub health_history_loaded: bool,
    pub config_sections: Vec<String>,
    pub failures: Vec<String>,
}

impl CadeCore {
    /// Load every core document, recording failures instead of stopping
    pub fn load(resolver: &Resolver) -> Self {
        let mut core = CadeCore::default();

        core.persona = core.load_json(resolver, PERSONA_FILE);
        core.knowledge = core.load_json(resolver, KNOWLEDGE_FILE);
        core.manifest = core.load_json(resolver, MANIFEST_FILE);
        core.health_history = core.load_json(resolver, HEALTH_HISTORY_FILE);

        match resolver.load_ini(INIT_CONFIG_FILE) {
            Ok(ini) => {
                if ini.is_empty() {
                    log::debug!("{} has no sections, using built-in auto-init settings", INIT_CONFIG_FILE);
                }
                core.config = ini;
            }
            Err(e) => core.record(INIT_CONFIG_FILE, e),
        }

        if core.is_initialized() {
            log::info!("CADE core documents loaded from {}", resolver.anchor().display());
        } else {
            log::warn!("CADE core loaded with {} failure(s)", core.failures.len());
        }

        core
    }

    fn load_json(&mut self, resolver: &Resolver, reference: &'static str) -> Value {
        match resolver.load_json(reference) {
            Ok(value) => value,
            Err(e) => {
                self.record(reference, e);
                Value::Null
            }
        }
    }

    fn record(&mut self, reference: &'static str, error: LoadError) {
        if error.is_not_found() {
            log::warn!("Missing {}: {}", reference, error);
        } else if error.is_parse() {
            log::error!("Malformed {}: {}", reference, error);
        } else {
            log::error!("Failed to load {}: {}", reference, error);
        }
        self.failures.push(DocumentFailure { reference, error });
    }

    /// True when every document loaded
    pub fn is_initialized(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn identity(&self) -> Value {
        persona_section(&self.persona, "identity")
    }

    pub fn directives(&self) -> Value {
        persona_section(&self.persona, "directives")
    }

    pub fn resurrection_protocol(&self) -> Value {
        persona_section(&self.persona, "resurrection_protocol")
    }

    /// Persona display name, if the identity carries one
    pub fn name(&self) -> Option<&str> {
        self.persona.get("identity")?.get("name")?.as_str()
    }

    /// The whole knowledge base, or one top-level entry
    pub fn knowledge(&self, key: Option<&str>) -> Option<&Value> {
        match key {
            Some(key) => self.knowledge.get(key),
            None if self.knowledge.is_null() => None,
            None => Some(&self.knowledge),
        }
    }

    pub fn auto_init(&self) -> AutoInitConfig {
        AutoInitConfig::from_ini(&self.config)
    }

    pub fn status(&self) -> CoreStatus {
        CoreStatus {
            initialized: self.is_initialized(),
            identity_loaded: is_present(&self.identity()),
            directives_loaded: is_present(&self.directives()),
            knowledge_loaded: is_present(&self.knowledge),
            manifest_loaded: is_present(&self.manifest),
            health_history_loaded: is_present(&self.health_history),
            config_sections: self.config.sections().map(String::from).collect(),
            failures: self
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.reference, f.error))
                .collect(),
        }
    }
}

fn persona_section(persona: &Value, key: &str) -> Value {
    persona
        .get(key)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Present and non-empty
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

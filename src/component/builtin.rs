//! Built-in components
//!
//! - `echo`: returns its `text` argument
//! - `identity`: responds with the persona name and directives
//! - `knowledge`: looks up a top-level knowledge-base entry
//! - `memory`: extension reporting memory store sizes

use eyre::Result;
use serde_json::{Value, json};

use super::{Component, ComponentInfo, ComponentKind, DirectiveResult, Registry};
use crate::documents::CadeCore;
use crate::memory::{MemoryStatus, MemoryStore};

const BUILTIN_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct EchoDirective {
    info: ComponentInfo,
}

impl EchoDirective {
    pub fn new() -> Self {
        Self {
            info: ComponentInfo::new("echo", BUILTIN_VERSION, ComponentKind::Directive)
                .with_description("Echo back the input text"),
        }
    }
}

impl Default for EchoDirective {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for EchoDirective {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn execute(&self, args: &Value) -> DirectiveResult {
        let text = args.get("text").and_then(Value::as_str).unwrap_or("");
        DirectiveResult::ok(format!("Echo: {}", text))
    }
}

/// Answers the init config's "respond with name and directive"
pub struct IdentityDirective {
    info: ComponentInfo,
    name: Option<String>,
    directives: Value,
    instruction: String,
}

impl IdentityDirective {
    pub fn new(core: &CadeCore) -> Self {
        Self {
            info: ComponentInfo::new("identity", BUILTIN_VERSION, ComponentKind::Directive)
                .with_description("Respond with the persona name and directives"),
            name: core.name().map(String::from),
            directives: core.directives(),
            instruction: core.auto_init().directive,
        }
    }
}

impl Component for IdentityDirective {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn execute(&self, _args: &Value) -> DirectiveResult {
        match &self.name {
            Some(name) => DirectiveResult::ok(name.clone())
                .with_data("name", json!(name))
                .with_data("directives", self.directives.clone())
                .with_data("instruction", json!(self.instruction)),
            None => DirectiveResult::error("Persona identity is not loaded"),
        }
    }
}

pub struct KnowledgeDirective {
    info: ComponentInfo,
    knowledge: Value,
}

impl KnowledgeDirective {
    pub fn new(core: &CadeCore) -> Self {
        Self {
            info: ComponentInfo::new("knowledge", BUILTIN_VERSION, ComponentKind::Directive)
                .with_description("Look up a knowledge-base entry by key"),
            knowledge: core.knowledge(None).cloned().unwrap_or(Value::Null),
        }
    }
}

impl Component for KnowledgeDirective {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn details(&self) -> Option<Value> {
        let entries = self.knowledge.as_object().map(|o| o.len()).unwrap_or(0);
        Some(json!({ "entries": entries }))
    }

    fn execute(&self, args: &Value) -> DirectiveResult {
        let Some(entries) = self.knowledge.as_object() else {
            return DirectiveResult::error("Knowledge base is not loaded");
        };

        match args.get("key").and_then(Value::as_str) {
            Some(key) => match entries.get(key) {
                Some(value) => DirectiveResult::ok(format!("Found '{}'", key)).with_data(key, value.clone()),
                None => DirectiveResult::error(format!("No knowledge entry '{}'", key)),
            },
            None => {
                let keys: Vec<&String> = entries.keys().collect();
                DirectiveResult::ok(format!("{} entries", keys.len())).with_data("keys", json!(keys))
            }
        }
    }
}

pub struct MemoryExtension {
    info: ComponentInfo,
    status: MemoryStatus,
}

impl MemoryExtension {
    pub fn new(store: &MemoryStore) -> Self {
        Self {
            info: ComponentInfo::new("memory", BUILTIN_VERSION, ComponentKind::Extension)
                .with_description("Conversation and context memory"),
            status: store.status(),
        }
    }
}

impl Component for MemoryExtension {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn details(&self) -> Option<Value> {
        serde_json::to_value(&self.status).ok()
    }
}

/// Registry with every built-in component registered
pub fn registry(core: &CadeCore, memory: Option<&MemoryStore>) -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(Box::new(EchoDirective::new()))?;
    registry.register(Box::new(IdentityDirective::new(core)))?;
    registry.register(Box::new(KnowledgeDirective::new(core)))?;
    if let Some(store) = memory {
        registry.register(Box::new(MemoryExtension::new(store)))?;
    }
    Ok(registry)
}

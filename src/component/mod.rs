//! Registrable components
//!
//! Plugins, extensions and directives share one trait; the kind tag decides
//! what the registry lets a component do. Directives are the only kind that
//! can be executed.

use eyre::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

pub mod builtin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Plugin,
    Extension,
    Directive,
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::Plugin => write!(f, "plugin"),
            ComponentKind::Extension => write!(f, "extension"),
            ComponentKind::Directive => write!(f, "directive"),
        }
    }
}

/// Component metadata
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub kind: ComponentKind,
}

impl ComponentInfo {
    pub fn new(name: &str, version: &str, kind: ComponentKind) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: String::new(),
            kind,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// Outcome of running a directive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveResult {
    pub success: bool,
    pub message: String,
    pub data: Map<String, Value>,
}

impl DirectiveResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }
}

/// A registrable component
pub trait Component {
    fn info(&self) -> &ComponentInfo;

    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Extra status fields reported alongside the common ones
    fn details(&self) -> Option<Value> {
        None
    }

    /// Run the component as a directive. Only called for `ComponentKind::Directive`.
    fn execute(&self, _args: &Value) -> DirectiveResult {
        DirectiveResult::error(format!("'{}' cannot be executed", self.info().name))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub name: String,
    pub version: String,
    pub kind: ComponentKind,
    pub initialized: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

struct Entry {
    component: Box<dyn Component>,
    initialized: bool,
}

/// Name-keyed component registry, registration order preserved
#[derive(Default)]
pub struct Registry {
    entries: IndexMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize and register a component. Duplicate names are rejected
    /// across all kinds; a component that fails to initialize is not kept.
    pub fn register(&mut self, mut component: Box<dyn Component>) -> Result<()> {
        let info = component.info().clone();

        if let Some(existing) = self.entries.get(&info.name) {
            eyre::bail!(
                "Component '{}' is already registered as a {}",
                info.name,
                existing.component.info().kind
            );
        }

        component
            .initialize()
            .with_context(|| format!("Failed to initialize {} '{}'", info.kind, info.name))?;

        log::info!("Registered {}: {} v{}", info.kind, info.name, info.version);
        self.entries.insert(
            info.name,
            Entry {
                component,
                initialized: true,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.entries.get(name).map(|e| e.component.as_ref())
    }

    /// Components of one kind, in registration order
    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &dyn Component> {
        self.entries
            .values()
            .map(|e| e.component.as_ref())
            .filter(move |c| c.info().kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch to a registered directive by name
    pub fn execute(&self, name: &str, args: &Value) -> DirectiveResult {
        let Some(entry) = self.entries.get(name) else {
            let known: Vec<&str> = self
                .of_kind(ComponentKind::Directive)
                .map(|c| c.info().name.as_str())
                .collect();
            return DirectiveResult::error(format!(
                "Unknown directive: {} (available: {})",
                name,
                known.join(", ")
            ));
        };

        let info = entry.component.info();
        if info.kind != ComponentKind::Directive {
            return DirectiveResult::error(format!("'{}' is a {}, not a directive", name, info.kind));
        }
        if !entry.initialized {
            return DirectiveResult::error(format!("Directive '{}' is not initialized", name));
        }

        log::debug!("Executing directive '{}' with args: {}", name, args);
        entry.component.execute(args)
    }

    /// Clean up every initialized component, newest first. Failures are
    /// logged and do not stop the sweep. Returns the number cleaned up.
    pub fn cleanup_all(&mut self) -> usize {
        let mut cleaned = 0;

        for entry in self.entries.values_mut().rev() {
            if !entry.initialized {
                continue;
            }
            let name = entry.component.info().name.clone();
            match entry.component.cleanup() {
                Ok(()) => {
                    entry.initialized = false;
                    cleaned += 1;
                    log::debug!("Cleaned up '{}'", name);
                }
                Err(e) => log::error!("Error cleaning up '{}': {:#}", name, e),
            }
        }

        cleaned
    }

    pub fn status(&self) -> Vec<ComponentStatus> {
        self.entries
            .values()
            .map(|entry| {
                let info = entry.component.info();
                ComponentStatus {
                    name: info.name.clone(),
                    version: info.version.clone(),
                    kind: info.kind,
                    initialized: entry.initialized,
                    status: if entry.initialized { "active" } else { "inactive" },
                    details: entry.component.details(),
                }
            })
            .collect()
    }
}

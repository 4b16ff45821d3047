//! Conversation and context memory
//!
//! Two JSON files in the memory directory:
//! - `conversation.json`: ordered array of turns
//! - `context.json`: flat object of key -> value
//!
//! Both are rewritten whole on every mutation. There is no locking; one
//! writer at a time is assumed.

use chrono::{DateTime, Local, NaiveDateTime};
use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, de, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CONVERSATION_FILE: &str = "conversation.json";
pub const CONTEXT_FILE: &str = "context.json";

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Turn {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Local::now(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// RFC 3339 timestamps, or offset-less ones (`2024-05-01T12:30:00.123456`)
/// taken as local time
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(stamped) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(stamped.with_timezone(&Local));
    }

    let naive: NaiveDateTime = raw
        .parse()
        .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| de::Error::custom(format!("timestamp '{}' does not exist in local time", raw)))
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryStatus {
    pub conversation_count: usize,
    pub context_size: usize,
    pub memory_dir: String,
}

/// Persistent conversation history and context map
pub struct MemoryStore {
    dir: PathBuf,
    conversation: Vec<Turn>,
    context: Map<String, Value>,
}

impl MemoryStore {
    /// Open (and create) a memory directory, loading any existing state.
    /// Unreadable files are logged and start empty.
    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create memory directory: {}", dir.display()))?;

        let conversation = load_or_default(&dir.join(CONVERSATION_FILE), "conversation history");
        let context = load_or_default(&dir.join(CONTEXT_FILE), "context memory");

        Ok(Self {
            dir,
            conversation,
            context,
        })
    }

    /// Append a turn and persist
    pub fn add_turn(&mut self, role: &str, content: &str, metadata: Map<String, Value>) -> Result<&Turn> {
        self.conversation.push(Turn::new(role, content).with_metadata(metadata));
        self.save()?;
        log::debug!("Added {} turn ({} total)", role, self.conversation.len());
        Ok(&self.conversation[self.conversation.len() - 1])
    }

    /// The last `n` turns, oldest first. `recent(0)` is empty; use
    /// [`MemoryStore::conversation`] for the whole history.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.conversation.len().saturating_sub(n);
        &self.conversation[start..]
    }

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    /// Set a context value and persist
    pub fn update_context(&mut self, key: &str, value: Value) -> Result<()> {
        self.context.insert(key.to_string(), value);
        self.save()?;
        log::debug!("Updated context key '{}'", key);
        Ok(())
    }

    pub fn get_context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Rewrite both memory files
    pub fn save(&self) -> Result<()> {
        write_json(&self.dir.join(CONVERSATION_FILE), &self.conversation)?;
        write_json(&self.dir.join(CONTEXT_FILE), &self.context)?;
        Ok(())
    }

    pub fn status(&self) -> MemoryStatus {
        MemoryStatus {
            conversation_count: self.conversation.len(),
            context_size: self.context.len(),
            memory_dir: self.dir.display().to_string(),
        }
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    if !path.exists() {
        return T::default();
    }

    let loaded: Result<T> = fs::read_to_string(path)
        .context("Failed to read file")
        .and_then(|content| serde_json::from_str(&content).context("Failed to parse JSON"));

    match loaded {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Error loading {} from {}: {:#}", what, path.display(), e);
            T::default()
        }
    }
}

/// Write through a temp file in the same directory, then rename over the target
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_string_pretty(value).context("Failed to serialize memory")?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(json.as_bytes()).context("Failed to write memory")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("memory");

        let store = MemoryStore::open(dir.clone()).unwrap();

        assert!(dir.is_dir());
        assert_eq!(store.status().conversation_count, 0);
        assert_eq!(store.status().context_size, 0);
    }

    #[test]
    fn test_add_turn_persists() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::open(temp.path().to_path_buf()).unwrap();

        let mut meta = Map::new();
        meta.insert("source".to_string(), json!("example"));
        store.add_turn("assistant", "Hello, I'm CADE.", Map::new()).unwrap();
        store.add_turn("user", "What can you do?", meta).unwrap();

        let reopened = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        assert_eq!(reopened.conversation().len(), 2);
        assert_eq!(reopened.conversation()[0].role, "assistant");
        assert_eq!(reopened.conversation()[1].content, "What can you do?");
        assert_eq!(reopened.conversation()[1].metadata["source"], "example");
        assert_eq!(reopened.conversation(), store.conversation());
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        for i in 0..7 {
            store.add_turn("user", &format!("msg {}", i), Map::new()).unwrap();
        }

        let recent: Vec<&str> = store.recent(3).iter().map(|t| t.content.as_str()).collect();
        assert_eq!(recent, vec!["msg 4", "msg 5", "msg 6"]);
        assert_eq!(store.recent(100).len(), 7);
        assert!(store.recent(0).is_empty());
    }

    #[test]
    fn test_offsetless_timestamps_survive_add_turn() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONVERSATION_FILE),
            r#"[{"role": "user", "content": "hi", "timestamp": "2024-05-01T12:30:00.123456", "metadata": {}},
                {"role": "assistant", "content": "hello", "timestamp": "2024-05-01T12:31:00"}]"#,
        )
        .unwrap();

        let mut store = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        assert_eq!(store.conversation().len(), 2);
        assert_eq!(
            store.conversation()[0].timestamp.naive_local().to_string(),
            "2024-05-01 12:30:00.123456"
        );

        store.add_turn("user", "still here?", Map::new()).unwrap();

        let reopened = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        let contents: Vec<&str> = reopened.conversation().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello", "still here?"]);
    }

    #[test]
    fn test_offset_timestamps_keep_their_instant() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "user",
            "content": "hi",
            "timestamp": "2024-05-01T12:30:00+02:00"
        }))
        .unwrap();
        assert_eq!(turn.timestamp.to_utc().to_rfc3339(), "2024-05-01T10:30:00+00:00");
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let parsed: Result<Turn, _> = serde_json::from_value(json!({
            "role": "user",
            "content": "hi",
            "timestamp": "yesterday"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_context_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::open(temp.path().to_path_buf()).unwrap();

        store.update_context("current_task", json!("explaining capabilities")).unwrap();
        store.update_context("mood", json!({"level": 3})).unwrap();
        store.update_context("current_task", json!("resting")).unwrap();

        let reopened = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get_context("current_task"), Some(&json!("resting")));
        assert_eq!(reopened.get_context("mood"), Some(&json!({"level": 3})));
        assert_eq!(reopened.get_context("missing"), None);
        assert_eq!(reopened.status().context_size, 2);
    }

    #[test]
    fn test_corrupt_files_start_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONVERSATION_FILE), "[{broken").unwrap();
        fs::write(temp.path().join(CONTEXT_FILE), r#"["not", "an", "object"]"#).unwrap();

        let store = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        assert!(store.conversation().is_empty());
        assert!(store.context().is_empty());
    }

    #[test]
    fn test_save_writes_pretty_json() {
        let temp = TempDir::new().unwrap();
        let mut store = MemoryStore::open(temp.path().to_path_buf()).unwrap();
        store.update_context("k", json!(1)).unwrap();

        let raw = fs::read_to_string(temp.path().join(CONTEXT_FILE)).unwrap();
        assert_eq!(raw, "{\n  \"k\": 1\n}");
        let conversation = fs::read_to_string(temp.path().join(CONVERSATION_FILE)).unwrap();
        assert_eq!(conversation, "[]");
    }
}

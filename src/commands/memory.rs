use colored::*;
use eyre::Result;
use std::path::Path;

use super::{parse_pairs, parse_value, print_structured};
use crate::cli::{MemoryAction, OutputFormat};
use crate::memory::MemoryStore;

pub fn run(action: MemoryAction, memory_dir: &Path) -> Result<()> {
    let mut store = MemoryStore::open(memory_dir.to_path_buf())?;

    match action {
        MemoryAction::Say { text, role, metadata } => say(&mut store, &role, &text, &metadata),
        MemoryAction::Remember { key, value } => remember(&mut store, &key, &value),
        MemoryAction::Recall { key } => recall(&store, &key),
        MemoryAction::Conversation { limit, format } => conversation(&store, limit, OutputFormat::resolve(format)),
    }
}

fn say(store: &mut MemoryStore, role: &str, text: &str, metadata: &[String]) -> Result<()> {
    let metadata = parse_pairs(metadata)?;
    let turn = store.add_turn(role, text, metadata)?;
    println!("{} Recorded {} turn", "✓".green(), turn.role.cyan());
    Ok(())
}

fn remember(store: &mut MemoryStore, key: &str, value: &str) -> Result<()> {
    store.update_context(key, parse_value(value))?;
    println!("{} Remembered {}", "✓".green(), key.cyan());
    Ok(())
}

fn recall(store: &MemoryStore, key: &str) -> Result<()> {
    match store.get_context(key) {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
        None => eyre::bail!("Nothing remembered under '{}'", key),
    }
}

fn conversation(store: &MemoryStore, limit: usize, format: OutputFormat) -> Result<()> {
    let turns = if limit == 0 { store.conversation() } else { store.recent(limit) };

    if print_structured(format, &turns)? {
        return Ok(());
    }

    if turns.is_empty() {
        println!("  {}", "(no conversation yet)".dimmed());
        return Ok(());
    }

    for turn in turns {
        println!(
            "{} {}: {}",
            turn.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            capitalize(&turn.role).cyan(),
            turn.content
        );
    }
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

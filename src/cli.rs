use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::loader::DecodePolicy;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

/// How `show` should parse a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentKind {
    Json,
    Ini,
    Text,
}

#[derive(Parser)]
#[command(
    name = "cade",
    about = "CADE bootstrap - resolve, load and remember",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/cade/logs/cade.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to cade.yaml config file")]
    pub config: Option<PathBuf>,

    /// Repository root to resolve documents against
    #[arg(short, long, global = true, help = "Repository root (overrides config and CADE_ROOT)")]
    pub root: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true, help = "Log at debug level")]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Log errors only")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the default init config and required directories
    Init {
        /// Overwrite an existing auto_init_cade.ini
        #[arg(long)]
        force: bool,
    },

    /// Verify required files exist and parse
    Check {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Load every core document and summarize what was loaded
    Absorb {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the resolved directory table
    Paths {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Resolve logical file references to absolute paths
    Resolve {
        /// File names or relative paths
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Load a document and print it
    Show {
        /// File name or relative path
        name: String,

        /// Parse as (default: from the file extension)
        #[arg(long = "as", value_enum)]
        kind: Option<DocumentKind>,

        /// Decode error handling for text
        #[arg(long, value_enum, default_value = "strict")]
        errors: DecodePolicy,
    },

    /// Print the persona identity
    Identity,

    /// Print the persona directives
    Directives,

    /// Print the persona resurrection protocol
    Resurrection,

    /// Show system status
    Status {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Conversation and context memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Run and list directives
    Directive {
        #[command(subcommand)]
        action: DirectiveAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum MemoryAction {
    /// Add a conversation turn
    Say {
        /// Message text
        text: String,

        /// Speaker role
        #[arg(long, default_value = "assistant")]
        role: String,

        /// Metadata entries (key=value, value parsed as JSON when possible)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        metadata: Vec<String>,
    },

    /// Store a context value
    Remember {
        /// Context key
        key: String,

        /// Value (parsed as JSON when possible, otherwise stored as a string)
        value: String,
    },

    /// Print a context value
    Recall {
        /// Context key
        key: String,
    },

    /// Show recent conversation turns
    Conversation {
        /// Maximum number of turns (0 shows the whole history)
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Subcommand)]
pub enum DirectiveAction {
    /// List registered components
    List {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Run a directive
    Run {
        /// Directive name
        name: String,

        /// Arguments (key=value, value parsed as JSON when possible)
        #[arg(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },
}

use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;
mod commands;
mod component;
mod config;
mod documents;
mod loader;
mod memory;

use cli::{Cli, Commands, OutputFormat};
use config::{Config, LogLevel};
use loader::Resolver;

fn setup_logging(log_level: LogLevel) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cade")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("cade.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    let mut builder = env_logger::Builder::new();
    let from_env = std::env::var("RUST_LOG").is_ok();

    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(match log_level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        });
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if from_env { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

/// Effective level after the -v / -q flags
fn effective_level(config: &Config, verbose: bool, quiet: bool) -> LogLevel {
    if verbose {
        LogLevel::Debug
    } else if quiet {
        LogLevel::Error
    } else {
        config.log_level
    }
}

fn run(command: Commands, config: &Config, anchor: &Path) -> Result<()> {
    let mut resolver = Resolver::new(anchor);
    let memory_dir = config.memory_dir(anchor);

    match command {
        Commands::Init { force } => commands::init::run(force, &mut resolver),
        Commands::Check { format } => commands::check::run(OutputFormat::resolve(format), &resolver),
        Commands::Absorb { format } => commands::absorb::run(OutputFormat::resolve(format), &resolver),
        Commands::Paths { format } => commands::paths::show(OutputFormat::resolve(format), &resolver),
        Commands::Resolve { names } => commands::paths::resolve(&names, &resolver),
        Commands::Show { name, kind, errors } => commands::show::run(&name, kind, errors, &resolver),
        Commands::Identity => commands::show::identity(&resolver),
        Commands::Directives => commands::show::directives(&resolver),
        Commands::Resurrection => commands::show::resurrection(&resolver),
        Commands::Status { format } => commands::status::run(OutputFormat::resolve(format), &resolver, &memory_dir),
        Commands::Memory { action } => commands::memory::run(action, &memory_dir),
        Commands::Directive { action } => commands::directive::run(action, &resolver, &memory_dir),
        Commands::Config { action } => commands::config::run(action, config, anchor),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before logging; its notes are replayed once the logger is up
    let (config, notes) = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(effective_level(&config, cli.verbose, cli.quiet)).context("Failed to setup logging")?;
    for (level, message) in notes {
        log::log!(level, "{}", message);
    }

    let anchor = config.anchor(cli.root.as_deref())?;
    info!("Starting cade with root {} (config: {:?})", anchor.display(), cli.config);

    run(cli.command, &config, &anchor).context("Command failed")?;

    Ok(())
}

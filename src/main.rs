use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use abt::config::{Config, LogLevel};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn open_log_file() -> Result<(fs::File, PathBuf)> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("abt")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("abt.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .context("Failed to open log file")?;
    Ok((file, log_file))
}

fn setup_logging(log_level: &LogLevel) {
    // RUST_LOG env var takes precedence, otherwise use config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(log_level.as_filter());
    }

    // Fall back to stderr when the log file is unavailable
    match open_log_file() {
        Ok((file, path)) => {
            builder.target(env_logger::Target::Pipe(Box::new(file))).init();
            info!("Logging initialized, writing to: {}", path.display());
        }
        Err(e) => {
            builder.target(env_logger::Target::Stderr).init();
            log::warn!("Logging to stderr: {:#}", e);
        }
    }

    info!(
        "Log level: {:?} (from {})",
        log_level,
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
}

fn run(cli: Cli, config: Config, root: PathBuf) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { path } => commands::init::run(&path),
        Commands::Compile { output } => commands::compile::run(&root, output, &config),
        Commands::Docs { output } => commands::docs::run(&root, output, &config),
        Commands::Run { host, port } => commands::run::run(&root, host, port, &config),
        Commands::Agents { format } => commands::agents::run(&root, cli::OutputFormat::resolve(format)),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<ExitCode> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    let root = std::env::current_dir().context("Failed to determine current directory")?;

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref(), &root).context("Failed to load configuration")?;

    setup_logging(&config.log_level);

    info!("Starting abt in {} with config from: {:?}", root.display(), cli.config);

    run(cli, config, root).context("Command failed")
}

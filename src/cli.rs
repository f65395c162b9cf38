use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

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

#[derive(Parser)]
#[command(
    name = "abt",
    about = "Agent Build Tool - compile agent documents into a manifest",
    version,
    after_help = "Logs are written to: ~/.local/share/abt/logs/abt.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to abt.yaml config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold a new ABT project
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Compile ABT project to manifest
    Compile {
        /// Output manifest path (defaults to abt_manifest.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate ABT docs
    Docs {
        /// Output directory (defaults to abt_docs)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run local chat runtime
    Run {
        /// Host interface for the local server
        #[arg(long)]
        host: Option<String>,

        /// Port for the local server
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compile and list agents
    Agents {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

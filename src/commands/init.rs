//! Scaffold a new ABT project

use colored::*;
use eyre::{Context, Result};
use std::path::Path;
use std::process::ExitCode;

use abt::scaffold::scaffold_project;

pub fn run(path: &Path) -> Result<ExitCode> {
    let target = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to determine current directory")?
            .join(path)
    };

    println!("{} Initializing ABT project in {}", "→".blue(), target.display());

    let report = scaffold_project(&target)?;
    let root = report.root.canonicalize().unwrap_or(report.root);

    for file in &report.created {
        println!("  {} Created {}", "✓".green(), file);
    }
    for file in &report.skipped {
        println!("  {} Kept existing {}", "•".dimmed(), file);
    }

    println!();
    println!("{} Initialized ABT project at {}", "✓".green().bold(), root.display());
    println!();
    println!("Next steps:");
    println!("  1. Run {} to build the manifest", "abt compile".cyan());
    println!("  2. Run {} to browse agent lineage", "abt docs".cyan());
    println!("  3. Run {} to chat with your agents", "abt run".cyan());

    Ok(ExitCode::SUCCESS)
}

//! Compile the project into a manifest file

use colored::*;
use eyre::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use abt::compile_project;
use abt::config::Config;

pub fn run(root: &Path, output: Option<PathBuf>, config: &Config) -> Result<ExitCode> {
    let manifest = match compile_project(root) {
        Ok(manifest) => manifest,
        Err(e) => return Ok(super::compile_failure("Compilation failed", &e)),
    };

    let output = output.unwrap_or_else(|| config.compile.output.clone());
    let output_path = Config::resolve_path(root, &output);
    manifest.write(&output_path)?;

    println!(
        "{} Compiled {} agent(s)",
        "✓".green(),
        manifest.agents.len().to_string().bold()
    );
    println!("Wrote manifest to {}", output_path.display());
    Ok(ExitCode::SUCCESS)
}

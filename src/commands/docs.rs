//! Generate static lineage docs

use colored::*;
use eyre::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use abt::compile_project;
use abt::config::Config;
use abt::docs::write_docs;

pub fn run(root: &Path, output: Option<PathBuf>, config: &Config) -> Result<ExitCode> {
    let manifest = match compile_project(root) {
        Ok(manifest) => manifest,
        Err(e) => return Ok(super::compile_failure("Docs generation failed", &e)),
    };

    let output_dir = Config::resolve_path(root, &output.unwrap_or_else(|| config.docs.output.clone()));
    let html_path = write_docs(&manifest, &output_dir)?;

    println!("{} Generated docs at {}", "✓".green(), html_path.display());
    Ok(ExitCode::SUCCESS)
}

//! CLI command handlers

use colored::*;
use std::process::ExitCode;

use abt::CompileError;

pub mod agents;
pub mod compile;
pub mod completions;
pub mod docs;
pub mod init;
pub mod run;

/// Print a one-line failure for a compile error and pick the exit code
pub fn compile_failure(prefix: &str, err: &CompileError) -> ExitCode {
    log::error!("{}: {}", prefix, err);
    eprintln!("{} {}: {}", "✗".red(), prefix, err);
    ExitCode::FAILURE
}

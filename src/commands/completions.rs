use clap::CommandFactory;
use clap_complete::generate;
use eyre::Result;
use std::io;
use std::process::ExitCode;

use crate::cli::Cli;

pub fn run(shell: clap_complete::Shell) -> Result<ExitCode> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "abt", &mut io::stdout());
    Ok(ExitCode::SUCCESS)
}

//! Serve the compiled manifest with the local chat runtime

use eyre::Result;
use std::path::Path;
use std::process::ExitCode;

use abt::compile_project;
use abt::config::Config;
use abt::runtime::run_server;

pub fn run(root: &Path, host: Option<String>, port: Option<u16>, config: &Config) -> Result<ExitCode> {
    let manifest = match compile_project(root) {
        Ok(manifest) => manifest,
        Err(e) => return Ok(super::compile_failure("Runtime startup failed", &e)),
    };

    let mut runtime = config.runtime.clone();
    if let Some(host) = host {
        runtime.host = host;
    }
    if let Some(port) = port {
        runtime.port = port;
    }

    log::info!("Starting runtime with {} agent(s)", manifest.agents.len());
    run_server(manifest, &runtime)?;
    Ok(ExitCode::SUCCESS)
}

//! List compiled agents

use colored::*;
use eyre::Result;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use crate::cli::OutputFormat;
use abt::compile_project;

#[derive(Serialize)]
struct AgentSummary {
    name: String,
    model_provider: Option<serde_json::Value>,
    temperature: Option<serde_json::Value>,
    dependencies: Vec<String>,
}

pub fn run(root: &Path, format: OutputFormat) -> Result<ExitCode> {
    let manifest = match compile_project(root) {
        Ok(manifest) => manifest,
        Err(e) => return Ok(super::compile_failure("Compilation failed", &e)),
    };

    let summaries: Vec<AgentSummary> = manifest
        .agents
        .iter()
        .map(|(name, agent)| AgentSummary {
            name: name.clone(),
            model_provider: agent.model_provider.clone(),
            temperature: agent.temperature.clone(),
            dependencies: agent.dependencies.clone(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&summaries)?),
        OutputFormat::Text => {
            println!("{}", "Compiled Agents:".bold());
            println!();

            if summaries.is_empty() {
                println!("  {} No agents found in {}", "(none)".dimmed(), root.join("agents").display());
            }

            for agent in &summaries {
                let provider = agent
                    .model_provider
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                println!("  {} {}", "●".green(), agent.name.bold());
                println!("    Provider: {}", provider.cyan());
                if agent.dependencies.is_empty() {
                    println!("    {}", "No dependencies".dimmed());
                } else {
                    println!("    Dependencies ({}):", agent.dependencies.len());
                    for dep in &agent.dependencies {
                        println!("      {} {}", "•".cyan(), dep);
                    }
                }
                println!();
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

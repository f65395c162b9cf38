//! Compiled manifest types

use chrono::{SecondsFormat, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::frontmatter::Metadata;

/// One compiled agent, before it is folded into the manifest
#[derive(Debug, Clone)]
pub struct AgentArtifact {
    pub name: String,
    pub metadata: Metadata,
    pub system_prompt: String,
    pub dependencies: Vec<String>,
}

/// Exported fields of an agent inside the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub model_provider: Option<Value>,
    pub temperature: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub system_prompt: String,
    pub dependencies: Vec<String>,
}

impl From<AgentArtifact> for AgentEntry {
    fn from(artifact: AgentArtifact) -> Self {
        let field = |key: &str| artifact.metadata.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            model_provider: field("model_provider"),
            temperature: field("temperature"),
            model: artifact
                .metadata
                .get("model")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            system_prompt: artifact.system_prompt,
            dependencies: artifact.dependencies,
        }
    }
}

impl AgentEntry {
    /// Provider name; non-string values are rendered as JSON text
    pub fn provider(&self) -> Option<String> {
        self.model_provider.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// The full compiled output of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub compiled_at: String,
    pub agents: BTreeMap<String, AgentEntry>,
}

impl Manifest {
    /// Create an empty manifest stamped with the current UTC time
    pub fn new() -> Self {
        Self {
            compiled_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            agents: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AgentEntry> {
        self.agents.get(name)
    }

    /// Pretty JSON rendering of the manifest
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize manifest")
    }

    /// Write the manifest as pretty JSON, creating parent directories
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?).with_context(|| format!("Failed to write manifest to {}", path.display()))?;
        log::info!("Wrote manifest to {}", path.display());
        Ok(())
    }

    /// Read a previously written manifest
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read manifest at {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse manifest at {}", path.display()))
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

//! Project compilation
//!
//! Turns `<root>/agents/*.md` into a [`Manifest`]. Each agent document is
//! frontmatter-parsed, then its body is expanded by a fresh [`RefResolver`]
//! so reference stacks and dependency lists never leak between agents.
//!
//! Compilation is fail-fast: the first error aborts the whole run.

use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod error;
pub mod expander;
pub mod frontmatter;
pub mod loader;
pub mod manifest;
pub mod resolver;

pub use error::CompileError;
pub use expander::{Expander, Resolve};
pub use frontmatter::{Frontmatter, Metadata, parse_frontmatter};
pub use manifest::{AgentArtifact, AgentEntry, Manifest};
pub use resolver::RefResolver;

/// Directory under the project root holding agent documents
pub const AGENTS_DIR: &str = "agents";

/// Compile every agent document under `root` into a manifest
pub fn compile_project(root: &Path) -> Result<Manifest, CompileError> {
    let agents_dir = root.join(AGENTS_DIR);
    if !agents_dir.is_dir() {
        return Err(CompileError::MissingAgentsDirectory { path: agents_dir });
    }

    let documents = list_agent_documents(&agents_dir)?;
    info!("Compiling {} agent document(s) in {}", documents.len(), agents_dir.display());

    let mut manifest = Manifest::new();
    let mut sources: HashMap<String, PathBuf> = HashMap::new();

    for path in documents {
        let artifact = compile_agent(root, &path)?;
        if let Some(first) = sources.get(&artifact.name) {
            return Err(CompileError::DuplicateAgent {
                name: artifact.name,
                first: first.clone(),
                second: path,
            });
        }
        debug!(
            "compile_project: {} -> {} dependencies",
            artifact.name,
            artifact.dependencies.len()
        );
        sources.insert(artifact.name.clone(), path);
        manifest.agents.insert(artifact.name.clone(), AgentEntry::from(artifact));
    }

    info!("Compiled {} agent(s)", manifest.agents.len());
    Ok(manifest)
}

/// Compile a single agent document
pub fn compile_agent(root: &Path, path: &Path) -> Result<AgentArtifact, CompileError> {
    let content = loader::read_document(path)?;
    let frontmatter = parse_frontmatter(&content);
    let name = agent_name(&frontmatter, path);
    debug!("compile_agent: {} from {}", name, path.display());

    let resolver = RefResolver::new(root, template_context(&frontmatter.metadata));
    let expanded = resolver.expand(&frontmatter.body)?;

    Ok(AgentArtifact {
        name,
        metadata: frontmatter.metadata,
        system_prompt: expanded.trim().to_string(),
        dependencies: resolver.into_dependencies(),
    })
}

/// Agent documents in `agents_dir`, sorted by file name
pub fn list_agent_documents(agents_dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(agents_dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| CompileError::io(agents_dir, e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == loader::DEFAULT_EXTENSION) {
            documents.push(path.to_path_buf());
        }
    }
    Ok(documents)
}

/// Name from the `name` key, else the file stem
fn agent_name(frontmatter: &Frontmatter, path: &Path) -> String {
    let explicit = match frontmatter.metadata.get("name") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    explicit.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Metadata exposed to templates as variables
fn template_context(metadata: &Metadata) -> Value {
    Value::Object(metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_agents_directory() {
        let temp = TempDir::new().unwrap();
        let err = compile_project(temp.path()).unwrap_err();
        assert!(matches!(err, CompileError::MissingAgentsDirectory { .. }));
    }

    #[test]
    fn test_empty_agents_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("agents")).unwrap();
        let manifest = compile_project(temp.path()).unwrap();
        assert!(manifest.agents.is_empty());
    }

    #[test]
    fn test_name_from_stem_and_prompt_trimmed() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/helper.md", "\n\n  Be helpful.  \n\n");
        let manifest = compile_project(temp.path()).unwrap();
        let entry = manifest.get("helper").unwrap();
        assert_eq!(entry.system_prompt, "Be helpful.");
        assert!(entry.dependencies.is_empty());
        assert_eq!(entry.model_provider, None);
    }

    #[test]
    fn test_only_markdown_documents_compiled() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/a.md", "A");
        write(temp.path(), "agents/notes.txt", "{{ broken");
        write(temp.path(), "agents/nested/b.md", "B");
        let manifest = compile_project(temp.path()).unwrap();
        assert_eq!(manifest.agents.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_list_agent_documents_sorted() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/zeta.md", "z");
        write(temp.path(), "agents/alpha.md", "a");
        write(temp.path(), "agents/mid.md", "m");
        let docs = list_agent_documents(&temp.path().join("agents")).unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["alpha.md", "mid.md", "zeta.md"]);
    }

    #[test]
    fn test_agents_isolated() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "macros/shared.md", "shared");
        write(temp.path(), "agents/one.md", "{{ref \"macros/shared\"}}");
        write(temp.path(), "agents/two.md", "{{ref \"macros/shared\"}} {{ref \"macros/shared\"}}");
        let manifest = compile_project(temp.path()).unwrap();
        assert_eq!(manifest.get("one").unwrap().dependencies, vec!["macros/shared.md"]);
        assert_eq!(
            manifest.get("two").unwrap().dependencies,
            vec!["macros/shared.md", "macros/shared.md"]
        );
    }

    #[test]
    fn test_failing_agent_aborts_compile() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/a_good.md", "fine");
        write(temp.path(), "agents/b_bad.md", "{{ref \"nowhere\"}}");
        let err = compile_project(temp.path()).unwrap_err();
        assert!(matches!(err, CompileError::ReferenceNotFound { .. }));
    }

    #[test]
    fn test_duplicate_agent_names() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/a.md", "---\nname: same\n---\nA");
        write(temp.path(), "agents/b.md", "---\nname: same\n---\nB");
        let err = compile_project(temp.path()).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateAgent { ref name, .. } if name == "same"));
    }

    #[test]
    fn test_metadata_variables_available() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "agents/named.md",
            "---\nname: greeter\nmodel: gpt-4o\n---\nI am {{name}} on {{model}}.",
        );
        let manifest = compile_project(temp.path()).unwrap();
        let entry = manifest.get("greeter").unwrap();
        assert_eq!(entry.system_prompt, "I am greeter on gpt-4o.");
        assert_eq!(entry.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_undeclared_variable_fails() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "agents/bad.md", "Hello {{ undeclared_var }}");
        let err = compile_project(temp.path()).unwrap_err();
        assert!(matches!(err, CompileError::UndefinedReference { .. }));
    }
}

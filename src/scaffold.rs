//! Starter project generation
//!
//! Lays out the directories `abt compile` expects and writes a sample agent
//! that references a skill and a macro. Existing files are left untouched.

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Directories created by `abt init`
pub const PROJECT_DIRS: &[&str] = &["agents", "skills/refund_policy", "tools", "macros"];

const OUTPUT_JSON_MACRO: &str = "Return responses in JSON with keys: \"answer\" and \"next_step\".\n";

const REFUND_POLICY_SKILL: &str = "If the user requests a refund, provide the official policy:
We offer refunds within 30 days of purchase with proof of receipt.
";

const SUPPORT_AGENT: &str = r#"---
name: support_agent
model_provider: openai
temperature: 0.2
---

You are the support agent. Use the refund policy when asked about refunds.

{{ref "skills/refund_policy"}}

{{ref "macros/output_json"}}
"#;

/// Starter files, relative to the project root
pub const STARTER_FILES: &[(&str, &str)] = &[
    ("macros/output_json.md", OUTPUT_JSON_MACRO),
    ("skills/refund_policy/SKILL.md", REFUND_POLICY_SKILL),
    ("agents/support_agent.md", SUPPORT_AGENT),
];

/// What `scaffold_project` did
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    pub root: PathBuf,
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Create a starter project at `target`
pub fn scaffold_project(target: &Path) -> Result<ScaffoldReport> {
    fs::create_dir_all(target).with_context(|| format!("Failed to create {}", target.display()))?;

    for dir in PROJECT_DIRS {
        let dir_path = target.join(dir);
        fs::create_dir_all(&dir_path).context(format!("Failed to create {}", dir))?;
    }

    let mut report = ScaffoldReport {
        root: target.to_path_buf(),
        ..Default::default()
    };

    for (rel, content) in STARTER_FILES {
        if write_if_missing(&target.join(rel), content)? {
            log::info!("scaffold: created {}", rel);
            report.created.push(rel.to_string());
        } else {
            log::debug!("scaffold: kept existing {}", rel);
            report.skipped.push(rel.to_string());
        }
    }

    Ok(report)
}

fn write_if_missing(path: &Path, content: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scaffold_creates_layout() {
        let temp = TempDir::new().unwrap();
        let report = scaffold_project(temp.path()).unwrap();

        for dir in PROJECT_DIRS {
            assert!(temp.path().join(dir).is_dir(), "missing {}", dir);
        }
        assert_eq!(report.created.len(), STARTER_FILES.len());
        assert!(report.skipped.is_empty());

        let agent = fs::read_to_string(temp.path().join("agents/support_agent.md")).unwrap();
        assert!(agent.starts_with("---\nname: support_agent\n"));
        assert!(agent.contains("{{ref \"skills/refund_policy\"}}"));
    }

    #[test]
    fn test_scaffold_keeps_existing_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("macros")).unwrap();
        fs::write(temp.path().join("macros/output_json.md"), "custom").unwrap();

        let report = scaffold_project(temp.path()).unwrap();
        assert_eq!(report.skipped, vec!["macros/output_json.md"]);
        assert_eq!(
            fs::read_to_string(temp.path().join("macros/output_json.md")).unwrap(),
            "custom"
        );
    }

    #[test]
    fn test_scaffold_into_new_nested_dir() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a").join("b");
        scaffold_project(&target).unwrap();
        assert!(target.join("agents/support_agent.md").exists());
    }
}

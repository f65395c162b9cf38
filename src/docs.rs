//! Static lineage docs
//!
//! Writes `lineage.json` (the manifest) and `index.html` (one card per agent
//! listing provider, temperature, and dependencies).

use eyre::{Context, Result};
use handlebars::html_escape;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::{AgentEntry, Manifest};

pub const LINEAGE_FILE: &str = "lineage.json";
pub const INDEX_FILE: &str = "index.html";

/// Default docs directory under the project root
pub const DEFAULT_DOCS_DIR: &str = "abt_docs";

/// Write docs for an already compiled manifest, returning the index path
pub fn write_docs(manifest: &Manifest, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let lineage_path = output_dir.join(LINEAGE_FILE);
    fs::write(&lineage_path, manifest.to_json()?)
        .with_context(|| format!("Failed to write {}", lineage_path.display()))?;

    let html_path = output_dir.join(INDEX_FILE);
    fs::write(&html_path, render_html(manifest)).with_context(|| format!("Failed to write {}", html_path.display()))?;

    log::info!("Wrote docs for {} agent(s) to {}", manifest.agents.len(), output_dir.display());
    Ok(html_path)
}

/// Render the lineage page
pub fn render_html(manifest: &Manifest) -> String {
    let cards: Vec<String> = manifest
        .agents
        .iter()
        .map(|(name, agent)| render_card(name, agent))
        .collect();

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>ABT Docs</title>
  <style>
    body {{ font-family: Arial, sans-serif; background: #f7f7f9; margin: 0; padding: 2rem; }}
    h1 {{ margin-bottom: 1rem; }}
    .grid {{ display: grid; gap: 1rem; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); }}
    .card {{ background: #fff; padding: 1.5rem; border-radius: 8px; box-shadow: 0 2px 6px rgba(0,0,0,0.08); }}
    ul {{ padding-left: 1.2rem; }}
  </style>
</head>
<body>
  <h1>Agent Build Tool Lineage</h1>
  <p>Generated documentation for compiled agents and their dependencies.</p>
  <p class="meta">Compiled at {compiled_at}</p>
  <div class="grid">
{cards}
  </div>
</body>
</html>
"#,
        compiled_at = html_escape(&manifest.compiled_at),
        cards = cards.join("\n"),
    )
}

fn render_card(name: &str, agent: &AgentEntry) -> String {
    let provider = agent.provider().unwrap_or_else(|| "unknown".to_string());
    let temperature = agent
        .temperature
        .as_ref()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "default".to_string());

    let mut deps = String::new();
    if agent.dependencies.is_empty() {
        deps.push_str("<li>No dependencies</li>");
    } else {
        for dep in &agent.dependencies {
            let _ = write!(deps, "<li>{}</li>", html_escape(dep));
        }
    }

    format!(
        r#"    <section class="card">
      <h2>{name}</h2>
      <p><strong>Model Provider:</strong> {provider}</p>
      <p><strong>Temperature:</strong> {temperature}</p>
      <h3>Dependencies</h3>
      <ul>{deps}</ul>
    </section>"#,
        name = html_escape(name),
        provider = html_escape(&provider),
        temperature = html_escape(&temperature),
        deps = deps,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_project;
    use crate::scaffold::scaffold_project;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(deps: &[&str]) -> AgentEntry {
        AgentEntry {
            model_provider: None,
            temperature: None,
            model: None,
            system_prompt: "p".to_string(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn test_card_defaults() {
        let html = render_card("bare", &entry(&[]));
        assert!(html.contains("<h2>bare</h2>"));
        assert!(html.contains("unknown"));
        assert!(html.contains("default"));
        assert!(html.contains("<li>No dependencies</li>"));
    }

    #[test]
    fn test_card_lists_dependencies_with_duplicates() {
        let mut agent = entry(&["macros/a.md", "macros/a.md"]);
        agent.model_provider = Some(json!("openai"));
        agent.temperature = Some(json!(0.2));
        let html = render_card("x", &agent);
        assert_eq!(html.matches("<li>macros/a.md</li>").count(), 2);
        assert!(html.contains("openai"));
        assert!(html.contains("0.2"));
    }

    #[test]
    fn test_card_escapes_text() {
        let html = render_card("<script>", &entry(&["a&b.md"]));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("a&amp;b.md"));
    }

    #[test]
    fn test_write_docs_from_scaffold() {
        let temp = TempDir::new().unwrap();
        scaffold_project(temp.path()).unwrap();

        let manifest = compile_project(temp.path()).unwrap();
        let index = write_docs(&manifest, &temp.path().join(DEFAULT_DOCS_DIR)).unwrap();
        assert_eq!(index, temp.path().join(DEFAULT_DOCS_DIR).join(INDEX_FILE));

        let html = fs::read_to_string(&index).unwrap();
        assert!(html.contains("support_agent"));
        assert!(html.contains("skills/refund_policy/SKILL.md"));

        let lineage = Manifest::load(&temp.path().join(DEFAULT_DOCS_DIR).join(LINEAGE_FILE)).unwrap();
        assert!(lineage.agents.contains_key("support_agent"));
    }

    #[test]
    fn test_write_docs_creates_nested_directory() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("site/docs");
        let index = write_docs(&Manifest::new(), &out).unwrap();
        assert!(index.is_file());
        assert!(out.join(LINEAGE_FILE).is_file());
    }
}

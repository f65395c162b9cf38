//! Frontmatter parsing for agent documents
//!
//! Splits a document into a YAML metadata block and a template body.
//!
//! # Format
//!
//! ```markdown
//! ---
//! name: support_agent
//! model_provider: openai
//! temperature: 0.2
//! ---
//!
//! You are the support agent.
//! ```
//!
//! Parsing is permissive: an unterminated block means the whole text is body,
//! and a block that is not a YAML mapping yields empty metadata.

use indexmap::IndexMap;
use log::warn;

/// Delimiter that opens and closes the metadata block
pub const DELIMITER: &str = "---";

/// Frontmatter key/value mapping, in document order
pub type Metadata = IndexMap<String, serde_json::Value>;

/// A document split into metadata and body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub metadata: Metadata,
    pub body: String,
}

/// Parse a document into metadata and body
pub fn parse_frontmatter(content: &str) -> Frontmatter {
    if content.starts_with(DELIMITER) {
        let parts: Vec<&str> = content.splitn(3, DELIMITER).collect();
        if let [_, raw_metadata, body] = parts.as_slice() {
            return Frontmatter {
                metadata: parse_metadata(raw_metadata),
                body: body.trim_start_matches('\n').to_string(),
            };
        }
    }

    Frontmatter {
        metadata: Metadata::new(),
        body: content.to_string(),
    }
}

fn parse_metadata(raw: &str) -> Metadata {
    if raw.trim().is_empty() {
        return Metadata::new();
    }

    match serde_yaml::from_str::<serde_yaml::Value>(raw) {
        Ok(serde_yaml::Value::Mapping(_)) => match serde_yaml::from_str::<Metadata>(raw) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Frontmatter mapping could not be read, ignoring it: {}", e);
                Metadata::new()
            }
        },
        Ok(serde_yaml::Value::Null) => Metadata::new(),
        Ok(_) => {
            warn!("Frontmatter is not a key/value mapping, ignoring it");
            Metadata::new()
        }
        Err(e) => {
            warn!("Failed to parse YAML frontmatter, ignoring it: {}", e);
            Metadata::new()
        }
    }
}

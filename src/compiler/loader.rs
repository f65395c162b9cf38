//! Document loading and reference path resolution
//!
//! A reference is a logical path relative to the project root. It resolves to
//! the first of:
//! 1. `<root>/<ref>/SKILL.md` when `<root>/<ref>` is a directory holding one
//! 2. `<root>/<ref>` when it exists
//! 3. `<root>/<ref>.md` when `<ref>` has no extension
//!
//! References are never resolved relative to the document that makes them,
//! and never leave the root: absolute references and `..` segments that climb
//! above it are rejected.

use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::error::CompileError;

/// Index file that stands in for a referenced directory
pub const INDEX_FILE: &str = "SKILL.md";

/// Extension tried when a reference omits one
pub const DEFAULT_EXTENSION: &str = "md";

/// Resolve a logical reference to a concrete document path under `root`
pub fn resolve_reference(root: &Path, reference: &str) -> Result<PathBuf, CompileError> {
    let normalized = reference.trim();
    if normalized.is_empty() {
        return Err(CompileError::EmptyReference);
    }

    let relative = confine(normalized).ok_or_else(|| CompileError::ReferenceOutsideRoot {
        reference: normalized.to_string(),
    })?;
    let candidate = root.join(relative);

    if candidate.is_dir() {
        let index = candidate.join(INDEX_FILE);
        if index.is_file() {
            debug!("resolve_reference: '{}' -> directory index {}", normalized, index.display());
            return Ok(index);
        }
    }

    if candidate.exists() {
        debug!("resolve_reference: '{}' -> {}", normalized, candidate.display());
        return Ok(candidate);
    }

    if candidate.extension().is_none() {
        let with_ext = candidate.with_extension(DEFAULT_EXTENSION);
        if with_ext.exists() {
            debug!("resolve_reference: '{}' -> inferred {}", normalized, with_ext.display());
            return Ok(with_ext);
        }
    }

    Err(CompileError::ReferenceNotFound {
        reference: normalized.to_string(),
    })
}

/// Lexically normalize a reference, or `None` if it is absolute or climbs above the root
fn confine(reference: &str) -> Option<PathBuf> {
    let mut confined = PathBuf::new();
    for component in Path::new(reference).components() {
        match component {
            Component::Normal(part) => confined.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !confined.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(confined)
}

/// Read a document's raw text
pub fn read_document(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|e| CompileError::io(path, e))
}

/// Render a path relative to the project root, using `/` separators
pub fn relative_display(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

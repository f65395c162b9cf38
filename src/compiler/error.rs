//! Compilation error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a compile run
///
/// Every variant is fatal at the point it is raised; `compile_project`
/// returns the first one it hits and no partial manifest.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("ref() was called with an empty path")]
    EmptyReference,

    #[error("ref() could not find '{reference}'")]
    ReferenceNotFound { reference: String },

    #[error("ref() path '{reference}' is outside the project root")]
    ReferenceOutsideRoot { reference: String },

    #[error("Cyclic ref detected: {chain}")]
    CyclicReference { chain: String },

    #[error("agents/ directory not found at {}", path.display())]
    MissingAgentsDirectory { path: PathBuf },

    #[error("Undefined reference in template: {detail}")]
    UndefinedReference { detail: String },

    #[error("Template error: {detail}")]
    Template { detail: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duplicate agent name '{name}' in {} and {}", first.display(), second.display())]
    DuplicateAgent {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl CompileError {
    /// Build an `Io` error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io {
            path: path.into(),
            source,
        }
    }
}

//! Recursive reference resolution with cycle detection
//!
//! One [`RefResolver`] serves exactly one agent. It keeps the stack of
//! documents currently being expanded and the ordered list of every document
//! visited. A path may appear in the dependency list many times but never
//! twice on the stack.

use log::debug;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::error::CompileError;
use super::expander::{Expander, Resolve};
use super::loader::{read_document, relative_display, resolve_reference};

/// Separator used when rendering a reference cycle
pub const CYCLE_SEPARATOR: &str = " -> ";

#[derive(Debug, Default)]
struct ResolverState {
    stack: Vec<PathBuf>,
    dependencies: Vec<String>,
}

/// Resolves `ref` calls for a single agent compilation
#[derive(Debug)]
pub struct RefResolver {
    root: PathBuf,
    context: Value,
    state: Mutex<ResolverState>,
}

impl RefResolver {
    /// Create a resolver rooted at `root`, rendering fragments with `context`
    pub fn new(root: impl Into<PathBuf>, context: Value) -> Self {
        Self {
            root: root.into(),
            context,
            state: Mutex::new(ResolverState::default()),
        }
    }

    /// Expand a top-level body. The body itself is not placed on the stack.
    pub fn expand(&self, body: &str) -> Result<String, CompileError> {
        Expander::new(self, &self.context).expand(body)
    }

    /// Dependencies recorded so far, in visit order
    pub fn dependencies(&self) -> Vec<String> {
        self.state().dependencies.clone()
    }

    /// Consume the resolver and return its dependency list
    pub fn into_dependencies(self) -> Vec<String> {
        let state = self.state.into_inner().unwrap_or_else(|e| e.into_inner());
        state.dependencies
    }

    /// Number of documents currently open
    pub fn depth(&self) -> usize {
        self.state().stack.len()
    }

    fn state(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Push `path` onto the stack, failing if it is already open
    fn enter(&self, path: &Path) -> Result<StackGuard<'_>, CompileError> {
        let mut state = self.state();
        if state.stack.iter().any(|open| open == path) {
            let chain = state
                .stack
                .iter()
                .map(PathBuf::as_path)
                .chain(std::iter::once(path))
                .map(|p| relative_display(&self.root, p))
                .collect::<Vec<_>>()
                .join(CYCLE_SEPARATOR);
            return Err(CompileError::CyclicReference { chain });
        }
        state.stack.push(path.to_path_buf());
        Ok(StackGuard { resolver: self })
    }

    fn record_dependency(&self, path: &Path) {
        let dependency = relative_display(&self.root, path);
        self.state().dependencies.push(dependency);
    }
}

impl Resolve for RefResolver {
    fn resolve(&self, reference: &str) -> Result<String, CompileError> {
        let path = resolve_reference(&self.root, reference)?;
        let _guard = self.enter(&path)?;
        debug!(
            "RefResolver::resolve: '{}' -> {} (depth {})",
            reference.trim(),
            path.display(),
            self.depth()
        );

        let content = read_document(&path)?;
        self.record_dependency(&path);

        // Fragments are pure template bodies; no frontmatter parsing here.
        Expander::new(self, &self.context).expand(&content)
    }
}

/// Pops the resolver stack when dropped, on success or failure
struct StackGuard<'a> {
    resolver: &'a RefResolver,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.resolver.state().stack.pop();
    }
}

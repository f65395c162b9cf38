//! ABT - Agent Build Tool
//!
//! Compiles a tree of agent documents (YAML frontmatter plus a Handlebars
//! body) into a single manifest, expanding `{{ref "path"}}` references
//! between documents and rejecting reference cycles.

pub mod compiler;
pub mod config;
pub mod docs;
pub mod runtime;
pub mod scaffold;

pub use compiler::{CompileError, Manifest, compile_project};

//! Source analyzers built on tree-sitter.
//!
//! - `python`: import statements and `__all__` assignments
//! - `api`: static route / settings-class extraction

pub mod api;
pub mod python;

pub use api::{ApiAnalyzer, ApiSurface};
pub use python::SourceAnalyzer;

//! Source analysis: raw text to structural model.
//!
//! The analyzer is the first stage of the engine. It parses a source unit
//! with tree-sitter, extracts declarations into [`SourceUnit`] values, and
//! records call sites and error guards for the downstream classifier and
//! synthesizer. It never executes the target.

pub mod extractor;
pub mod types;

pub use extractor::analyze_source;
pub use types::{
    CallSite, ErrorGuard, ImportDecl, ModuleModel, Param, ParseIssue, SourceUnit, UnitKind,
};

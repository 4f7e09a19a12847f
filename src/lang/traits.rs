//! The [`Language`] trait: everything the analyzer needs from a grammar.
//!
//! Implementations supply tree-sitter queries locating declarations and call
//! sites, plus node-level extraction into language-neutral declaration
//! records. The analyzer drives the queries; implementations never walk the
//! whole tree themselves except for imports, which are cheapest read off the
//! root in one pass.

use tree_sitter::{Language as TSLanguage, Node, Parser, Tree};

use crate::analyzer::types::{ErrorGuard, ImportDecl, Param};
use crate::error::Result;

/// A registered language implementation, shared process-wide.
pub type BoxedLanguage = Box<dyn Language>;

/// A function or method declaration in language-neutral form.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<String>,
    /// Decorators (Python) or annotations (Java), verbatim without `@`.
    pub decorators: Vec<String>,
    pub guards: Vec<ErrorGuard>,
    /// Body text, used for source-pattern scans downstream.
    pub body: String,
    pub is_async: bool,
    pub is_private: bool,
    pub is_static: bool,
    /// 1-indexed lines covering the full declaration including decorators.
    pub line: usize,
    pub end_line: usize,
    pub byte_range: (usize, usize),
}

/// A class declaration with its methods and constructor signature.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub bases: Vec<String>,
    /// Methods in declaration order, `__init__`/constructors excluded.
    pub methods: Vec<FunctionDecl>,
    /// Parameters of the constructor, receiver excluded.
    pub constructor_params: Vec<Param>,
    pub decorators: Vec<String>,
    pub is_private: bool,
    pub line: usize,
    pub end_line: usize,
    pub byte_range: (usize, usize),
}

/// Language support contract for the source analyzer.
///
/// Implementations are registered once and shared across worker threads, so
/// the trait carries the `Send + Sync` bounds itself.
pub trait Language: Send + Sync {
    /// Canonical lowercase language name.
    fn name(&self) -> &'static str;

    /// File extensions including the leading dot.
    fn extensions(&self) -> &[&'static str];

    /// The tree-sitter grammar, used to compile cached queries.
    fn ts_language(&self) -> TSLanguage;

    /// A fresh parser configured for this grammar.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TestsmithError::TreeSitter`] when the grammar
    /// version is incompatible with the linked tree-sitter runtime.
    fn parser(&self) -> Result<Parser>;

    /// Query matching top-level and nested function declarations.
    fn function_query(&self) -> &'static str;

    /// Query matching class declarations.
    fn class_query(&self) -> &'static str;

    /// Query matching call sites.
    fn call_query(&self) -> &'static str;

    /// Extract a function declaration from a matched node.
    fn extract_function(&self, node: Node, source: &[u8]) -> Option<FunctionDecl>;

    /// Extract a class declaration, its methods included, from a matched node.
    fn extract_class(&self, node: Node, source: &[u8]) -> Option<ClassDecl>;

    /// Collect import declarations from the module root.
    fn extract_imports(&self, tree: &Tree, source: &[u8]) -> Vec<ImportDecl>;

    /// Resolve a matched call node to its dotted target, receiver prefixes
    /// (`self.`, `this.`) stripped.
    fn call_target(&self, node: Node, source: &[u8]) -> Option<String>;
}

/// UTF-8 text of a node. Sources arrive as `&str`, so the byte range is
/// always valid UTF-8 and the fallback never triggers.
pub fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

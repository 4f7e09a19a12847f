//! Language abstraction layer.
//!
//! Provides a unified interface for multi-language source analysis via the
//! [`Language`] trait. Each supported language implements the trait to
//! provide tree-sitter queries and extraction logic.

pub mod registry;
pub mod traits;

// Language implementations
pub mod java;
pub mod python;

pub use registry::LanguageRegistry;
pub use traits::{BoxedLanguage, ClassDecl, FunctionDecl, Language};

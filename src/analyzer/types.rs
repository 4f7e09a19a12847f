//! Structural model produced by the source analyzer.
//!
//! A [`SourceUnit`] is one analyzed declaration (function, method, class, or
//! route handler) with everything downstream stages need: the signature, the
//! recorded call targets, detected error guards, and the raw body text for
//! pattern-based scanning. Units are immutable after analysis; enrichment
//! stages wrap them instead of mutating them.

use serde::{Deserialize, Serialize};

/// Kind of analyzed declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Function,
    Method,
    Class,
    RouteHandler,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Method => write!(f, "method"),
            Self::Class => write!(f, "class"),
            Self::RouteHandler => write!(f, "route_handler"),
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Declared type hint, verbatim from the source, if any.
    #[serde(default)]
    pub type_hint: Option<String>,
    /// Default value expression text, if any.
    #[serde(default)]
    pub default: Option<String>,
}

impl Param {
    /// Convenience constructor for untyped parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
        }
    }
}

/// A detected error-raising branch guarded by a recognizable condition.
///
/// Recorded when a parameter is compared against a literal and the guarded
/// branch raises/throws. The trigger is kept as verbatim source text; the
/// synthesizer parses it back into a literal when building the error case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorGuard {
    /// Name of the guarded parameter.
    pub param: String,
    /// Literal text the parameter is compared against (e.g. `0`, `""`).
    pub trigger: String,
    /// Raised error kind (e.g. `ValueError`, `IllegalArgumentException`).
    pub error_kind: String,
    /// 1-indexed line of the guard.
    pub line: usize,
}

/// A recorded call site inside a unit body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Dotted call target as written (e.g. `requests.get`, `cursor.execute`).
    pub target: String,
    /// 1-indexed line of the call.
    pub line: usize,
}

/// One analyzed declaration. Immutable after analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    /// Stable identifier: `file_stem.Class.method` or `file_stem.function`.
    pub id: String,
    /// Bare declaration name.
    pub name: String,
    /// Declaration kind.
    pub kind: UnitKind,
    /// Ordered parameter list (receiver parameters already stripped).
    pub params: Vec<Param>,
    /// Declared return type hint, if any.
    #[serde(default)]
    pub return_type: Option<String>,
    /// Decorators (Python) or annotations (Java), verbatim without the
    /// leading `@`. Unusual constructs are carried here as opaque metadata
    /// rather than rejected.
    #[serde(default)]
    pub decorators: Vec<String>,
    /// Call sites recorded in the unit body, in source order.
    #[serde(default)]
    pub calls: Vec<CallSite>,
    /// Detected error guards.
    #[serde(default)]
    pub guards: Vec<ErrorGuard>,
    /// Raw body text, used for pattern-based scans (secrets, weak crypto).
    #[serde(default)]
    pub body: String,
    /// Whether the unit is async.
    #[serde(default)]
    pub is_async: bool,
    /// Whether the unit is private by the language's convention.
    #[serde(default)]
    pub is_private: bool,
    /// Whether the unit is static (no receiver needed).
    #[serde(default)]
    pub is_static: bool,
    /// Enclosing class name for methods.
    #[serde(default)]
    pub class_name: Option<String>,
    /// 1-indexed start line.
    pub line: usize,
    /// 1-indexed end line.
    pub end_line: usize,
    /// Byte range in the source text, used to scope call assignment.
    #[serde(skip)]
    pub byte_range: (usize, usize),
    /// Owning file path.
    pub file: String,
    /// Source language name.
    pub language: String,
}

impl SourceUnit {
    /// Call target strings in source order.
    #[must_use]
    pub fn call_targets(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.target.as_str()).collect()
    }

    /// Whether any parameter has a string-ish or missing type hint.
    #[must_use]
    pub fn has_string_param(&self) -> bool {
        use crate::synth::values::BaseType;
        self.params
            .iter()
            .any(|p| BaseType::from_hint(p.type_hint.as_deref()) == BaseType::Str)
    }
}

/// One import declaration from the analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Imported module or package path.
    pub module: String,
    /// Imported names (`from x import a, b`); empty for plain imports.
    #[serde(default)]
    pub names: Vec<String>,
    /// 1-indexed line.
    pub line: usize,
}

/// A syntax problem found while analyzing a file. Fatal for the units whose
/// span overlaps it; the rest of the file still analyzes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// 1-indexed line of the error.
    pub line: usize,
    /// 1-indexed column of the error.
    pub column: usize,
    /// Description of the problem.
    pub message: String,
    /// Name of the unit dropped because of this issue, when attributable.
    #[serde(default)]
    pub unit: Option<String>,
}

/// Full analysis result for one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleModel {
    /// Analyzed file path, verbatim from the caller.
    pub file: String,
    /// Language name the file was analyzed as.
    pub language: String,
    /// Imports, in source order.
    pub imports: Vec<ImportDecl>,
    /// Analyzed units, ordered by start line.
    pub units: Vec<SourceUnit>,
    /// Localized syntax errors; units overlapping them were skipped.
    #[serde(default)]
    pub issues: Vec<ParseIssue>,
}

impl ModuleModel {
    /// File stem used to derive unit identifiers and output file names.
    #[must_use]
    pub fn stem(&self) -> String {
        std::path::Path::new(&self.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module")
            .to_string()
    }

    /// Whether any import matches the given module prefix.
    #[must_use]
    pub fn imports_module(&self, prefix: &str) -> bool {
        self.imports.iter().any(|i| {
            i.module == prefix
                || i.module.starts_with(&format!("{prefix}."))
                || i.names.iter().any(|n| n == prefix)
        })
    }
}

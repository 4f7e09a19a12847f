//! testsmith: automated test-suite generation from static analysis.
//!
//! Parses Python and Java sources with tree-sitter, builds a structural
//! model of every declared unit, classifies external effects and dangerous
//! operations, synthesizes abstract test cases (happy-path, boundary, error,
//! security probe, framework), plans mocks and fixtures, and renders pytest
//! or JUnit 5 suites under a configurable file-size limit.
//!
//! The engine performs no I/O beyond reading source text handed in by the
//! caller and, on request, writing rendered output. Runs are deterministic:
//! the same sources and configuration produce byte-identical files.
//!
//! ```no_run
//! use testsmith::{GeneratorConfig, SourceInput, SuiteGenerator};
//!
//! # fn main() -> testsmith::Result<()> {
//! let generator = SuiteGenerator::new(GeneratorConfig::default())?;
//! let sources = vec![SourceInput::new(
//!     "calculator.py",
//!     std::fs::read_to_string("calculator.py")?,
//! )];
//! let result = generator.generate(&sources);
//! result.write_to("tests/generated")?;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod detect;
pub mod effects;
pub mod emit;
pub mod error;
pub mod lang;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod synth;

pub use analyzer::analyze_source;
pub use analyzer::types::{ModuleModel, SourceUnit, UnitKind};
pub use config::{CoverageType, GeneratorConfig, MockLevel};
pub use detect::{detect_framework, FrameworkBinding, FrameworkKind, HttpVerb};
pub use effects::{EffectTable, EffectTag, Severity, VulnClass};
pub use emit::{emit_suite, OutputUnit};
pub use error::{Result, TestsmithError};
pub use pipeline::{SourceInput, SuiteGenerator, SuiteResult};
pub use plan::{plan_suite, FixtureScope, FixtureSpec, SuitePlan};
pub use report::{Diagnostic, DiagnosticKind, GenerationSummary, VulnerabilityRecord};
pub use synth::{synthesize, CaseKind, Expected, Literal, TestCaseSpec, ValueTables};

//! Run reporting: diagnostics, vulnerability records, and the final summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::effects::{Severity, VulnClass};

/// Diagnostic category, mirroring the stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    ClassificationWarning,
    ConfigurationError,
    EmissionError,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseError => write!(f, "parse_error"),
            Self::ClassificationWarning => write!(f, "classification_warning"),
            Self::ConfigurationError => write!(f, "configuration_error"),
            Self::EmissionError => write!(f, "emission_error"),
        }
    }
}

/// One diagnostic surfaced to the caller instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

/// One flagged vulnerability, carried through to the summary whether or not
/// a probe case was synthesized for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub class: VulnClass,
    pub severity: Severity,
    pub unit_id: String,
    pub symbol: String,
    pub file: String,
    pub line: usize,
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub files_analyzed: usize,
    pub units_analyzed: usize,
    pub units_skipped: usize,
    /// Case counts keyed by case kind name.
    pub cases_by_kind: BTreeMap<String, usize>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub output_files: Vec<String>,
}

impl GenerationSummary {
    /// Total synthesized cases across kinds.
    #[must_use]
    pub fn total_cases(&self) -> usize {
        self.cases_by_kind.values().sum()
    }

    pub fn count_case(&mut self, kind: &str) {
        *self.cases_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }
}

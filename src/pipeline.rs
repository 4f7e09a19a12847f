//! End-to-end generation pipeline.
//!
//! Per-file analysis, classification, and synthesis run in parallel since
//! files are independent; fixture planning and output partitioning need
//! suite-global state and run in a single-threaded reduction afterwards.
//! Failures isolate: one malformed file or one misconfigured suite never
//! aborts its siblings.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyzer::analyze_source;
use crate::analyzer::types::{ModuleModel, UnitKind};
use crate::config::GeneratorConfig;
use crate::detect::detect_framework;
use crate::effects::EffectTable;
use crate::emit::{emit_suite, OutputUnit};
use crate::error::{Result, TestsmithError};
use crate::lang::LanguageRegistry;
use crate::plan::plan_suite;
use crate::report::{Diagnostic, DiagnosticKind, GenerationSummary, VulnerabilityRecord};
use crate::synth::cases::TestCaseSpec;
use crate::synth::{synthesize, ValueTables};

/// One source file handed to the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInput {
    pub path: String,
    /// Language tag; inferred from the file extension when absent.
    pub language: Option<String>,
    pub text: String,
}

impl SourceInput {
    #[must_use]
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: None,
            text: text.into(),
        }
    }
}

/// A unit left untested, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedUnit {
    pub file: String,
    pub unit: Option<String>,
    pub reason: String,
}

/// Structured result of one run: rendered files, diagnostics, skips, and the
/// machine-readable summary. Never an all-or-nothing failure.
#[derive(Debug, Clone, Default)]
pub struct SuiteResult {
    pub outputs: Vec<OutputUnit>,
    pub diagnostics: Vec<Diagnostic>,
    pub skipped: Vec<SkippedUnit>,
    pub summary: GenerationSummary,
}

impl SuiteResult {
    /// Write every rendered file into `dir`, creating it if needed. The only
    /// file I/O the engine performs.
    ///
    /// # Errors
    ///
    /// I/O failures are reported to the caller synchronously, never retried.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for output in &self.outputs {
            std::fs::write(dir.join(&output.file_name), &output.content)?;
        }
        Ok(())
    }
}

/// Per-file synthesis product, before the sequential reduction.
struct FileSynthesis {
    module: ModuleModel,
    cases: Vec<TestCaseSpec>,
    diagnostics: Vec<Diagnostic>,
    skipped: Vec<SkippedUnit>,
    vulnerabilities: Vec<VulnerabilityRecord>,
    units_analyzed: usize,
}

/// Test-suite generator configured once, reusable across runs.
pub struct SuiteGenerator {
    config: GeneratorConfig,
    effects: EffectTable,
    values: ValueTables,
}

impl SuiteGenerator {
    /// Validate configuration and build the run tables.
    ///
    /// # Errors
    ///
    /// Returns [`TestsmithError::Config`] for invalid option values.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let effects = EffectTable::with_extensions(&config.mock_dependencies)?;
        let values = ValueTables::from_config(&config);
        Ok(Self {
            config,
            effects,
            values,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run the full pipeline over a batch of source files.
    #[must_use]
    pub fn generate(&self, inputs: &[SourceInput]) -> SuiteResult {
        info!(files = inputs.len(), "starting suite generation");

        // Parallel phase: analysis and synthesis are independent per file.
        let per_file: Vec<std::result::Result<FileSynthesis, (String, TestsmithError)>> = inputs
            .par_iter()
            .map(|input| self.synthesize_file(input))
            .collect();

        // Sequential reduction: planning, partitioning, and the summary need
        // global ordering.
        let mut result = SuiteResult::default();
        for outcome in per_file {
            match outcome {
                Ok(synthesis) => self.reduce_file(synthesis, &mut result),
                Err((path, error)) => {
                    result.diagnostics.push(file_error_diagnostic(&path, &error));
                    result.skipped.push(SkippedUnit {
                        file: path,
                        unit: None,
                        reason: error.to_string(),
                    });
                }
            }
        }

        result.summary.units_skipped = result.skipped.len();
        result.summary.output_files = result
            .outputs
            .iter()
            .map(|o| o.file_name.clone())
            .collect();
        info!(
            files = result.summary.files_analyzed,
            units = result.summary.units_analyzed,
            cases = result.summary.total_cases(),
            outputs = result.outputs.len(),
            "suite generation finished"
        );
        result
    }

    fn synthesize_file(
        &self,
        input: &SourceInput,
    ) -> std::result::Result<FileSynthesis, (String, TestsmithError)> {
        let language = match input.language.as_deref() {
            Some(name) => name.to_string(),
            None => LanguageRegistry::global()
                .detect_language(Path::new(&input.path))
                .map(|l| l.name().to_string())
                .ok_or_else(|| {
                    (
                        input.path.clone(),
                        TestsmithError::UnsupportedLanguage(input.path.clone()),
                    )
                })?,
        };
        let module = analyze_source(&input.text, &language, &input.path)
            .map_err(|e| (input.path.clone(), e))?;
        debug!(file = %input.path, units = module.units.len(), "analyzed module");

        let mut diagnostics = Vec::new();
        let mut skipped = Vec::new();
        let mut vulnerabilities = Vec::new();
        let mut cases = Vec::new();
        let mut units_analyzed = 0;

        for issue in &module.issues {
            diagnostics.push(
                Diagnostic::new(DiagnosticKind::ParseError, issue.message.clone())
                    .with_location(module.file.clone(), issue.line),
            );
            skipped.push(SkippedUnit {
                file: module.file.clone(),
                unit: issue.unit.clone(),
                reason: issue.message.clone(),
            });
        }

        let mut enriched_units = Vec::with_capacity(module.units.len());
        for unit in &module.units {
            if unit.is_private && !self.config.include_private {
                skipped.push(SkippedUnit {
                    file: module.file.clone(),
                    unit: Some(unit.id.clone()),
                    reason: "private unit excluded by configuration".to_string(),
                });
                enriched_units.push(unit.clone());
                continue;
            }
            units_analyzed += 1;

            let detection = detect_framework(&module, unit);
            if let Some(warning) = detection.warning {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::ClassificationWarning, warning)
                        .with_location(module.file.clone(), unit.line),
                );
            }
            let mut unit = unit.clone();
            if detection.binding.is_some() && unit.kind == UnitKind::Function {
                unit.kind = UnitKind::RouteHandler;
            }

            let classification = self.effects.classify(&unit);
            for finding in &classification.vulns {
                vulnerabilities.push(VulnerabilityRecord {
                    class: finding.class,
                    severity: finding.severity,
                    unit_id: unit.id.clone(),
                    symbol: finding.symbol.clone(),
                    file: module.file.clone(),
                    line: finding.line,
                });
            }

            cases.extend(synthesize(
                &unit,
                &classification,
                detection.binding.as_ref(),
                &self.config,
                &self.values,
            ));
            enriched_units.push(unit);
        }

        let mut module = module;
        module.units = enriched_units;
        Ok(FileSynthesis {
            module,
            cases,
            diagnostics,
            skipped,
            vulnerabilities,
            units_analyzed,
        })
    }

    fn reduce_file(&self, synthesis: FileSynthesis, result: &mut SuiteResult) {
        result.diagnostics.extend(synthesis.diagnostics);
        result.skipped.extend(synthesis.skipped);
        result.summary.files_analyzed += 1;
        result.summary.units_analyzed += synthesis.units_analyzed;
        result
            .summary
            .vulnerabilities
            .extend(synthesis.vulnerabilities);
        for case in &synthesis.cases {
            result.summary.count_case(&case.kind.to_string());
        }

        if synthesis.cases.is_empty() {
            return;
        }

        // A configuration failure aborts this suite only.
        let plan = match plan_suite(&self.config, synthesis.cases) {
            Ok(plan) => plan,
            Err(error) => {
                warn!(file = %synthesis.module.file, %error, "suite planning failed");
                result.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::ConfigurationError, error.to_string())
                        .with_location(synthesis.module.file.clone(), 1),
                );
                return;
            }
        };

        match emit_suite(&synthesis.module, &plan, &self.config) {
            Ok(emitted) => {
                result.diagnostics.extend(emitted.diagnostics);
                merge_outputs(&mut result.outputs, emitted.outputs);
            }
            Err(error) => {
                result.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::EmissionError, error.to_string())
                        .with_location(synthesis.module.file.clone(), 1),
                );
            }
        }
    }
}

fn file_error_diagnostic(path: &str, error: &TestsmithError) -> Diagnostic {
    match error {
        TestsmithError::Parse { line, column, message, .. } => {
            let mut diag = Diagnostic::new(DiagnosticKind::ParseError, message.clone())
                .with_location(path, *line);
            diag.column = Some(*column);
            diag
        }
        other => {
            Diagnostic::new(DiagnosticKind::ParseError, other.to_string()).with_location(path, 1)
        }
    }
}

/// Suites share one output directory; `conftest.py` from several Python
/// suites folds into a single file.
fn merge_outputs(existing: &mut Vec<OutputUnit>, incoming: Vec<OutputUnit>) {
    for output in incoming {
        if output.file_name == "conftest.py" {
            if let Some(previous) = existing.iter_mut().find(|o| o.file_name == "conftest.py") {
                let body = output
                    .content
                    .splitn(3, '\n')
                    .nth(2)
                    .unwrap_or(&output.content);
                previous.content.push('\n');
                previous.content.push_str(body);
                previous.line_count = previous.content.lines().count();
                continue;
            }
        }
        existing.push(output);
    }
}

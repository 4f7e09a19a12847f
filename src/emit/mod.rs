//! Emission: rendered test files from planned suites.
//!
//! Rendering is language-specific (`pytest` for Python sources, `junit` for
//! Java) but partitioning is shared: cases are greedily packed into output
//! files in their synthesis order, and a single case is never split across
//! files. A case whose rendered text alone exceeds the configured limit is
//! emitted alone in an oversized file and reported, never dropped.

pub mod junit;
pub mod pytest;

use serde::{Deserialize, Serialize};

use crate::analyzer::types::{ModuleModel, SourceUnit};
use crate::config::GeneratorConfig;
use crate::error::{Result, TestsmithError};
use crate::plan::SuitePlan;
use crate::report::Diagnostic;

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputUnit {
    pub file_name: String,
    pub content: String,
    pub language: String,
    /// Names of the cases rendered into this file, in order. Empty for
    /// shared fixture files.
    pub case_names: Vec<String>,
    pub line_count: usize,
}

impl OutputUnit {
    pub(crate) fn new(
        file_name: impl Into<String>,
        content: String,
        language: &str,
        case_names: Vec<String>,
    ) -> Self {
        let line_count = content.lines().count();
        Self {
            file_name: file_name.into(),
            content,
            language: language.to_string(),
            case_names,
            line_count,
        }
    }
}

/// Emission result for one suite.
#[derive(Debug, Clone, Default)]
pub struct EmitResult {
    pub outputs: Vec<OutputUnit>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render one suite into output files.
///
/// # Errors
///
/// Returns [`TestsmithError::UnsupportedLanguage`] for languages without a
/// renderer; per-case problems surface as diagnostics, not errors.
pub fn emit_suite(
    module: &ModuleModel,
    plan: &SuitePlan,
    config: &GeneratorConfig,
) -> Result<EmitResult> {
    match module.language.as_str() {
        "python" => Ok(pytest::emit(module, plan, config)),
        "java" => Ok(junit::emit(module, plan, config)),
        other => Err(TestsmithError::UnsupportedLanguage(other.to_string())),
    }
}

/// A rendered case block: contiguous lines, atomic across files.
#[derive(Debug, Clone)]
pub(crate) struct RenderedBlock {
    /// Name of the (first) case in the block, for diagnostics.
    pub case_name: String,
    pub lines: Vec<String>,
}

impl RenderedBlock {
    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Greedy partition of case blocks into output files.
///
/// Returns the index ranges of each file plus the indices of blocks that
/// individually exceed the limit. With splitting disabled everything lands in
/// one file.
pub(crate) fn partition_blocks(
    blocks: &[RenderedBlock],
    max_lines: usize,
    split: bool,
) -> (Vec<std::ops::Range<usize>>, Vec<usize>) {
    if blocks.is_empty() {
        return (Vec::new(), Vec::new());
    }
    if !split {
        return (vec![0..blocks.len()], Vec::new());
    }

    let mut ranges = Vec::new();
    let mut oversized = Vec::new();
    let mut start = 0;
    let mut current = 0;
    for (index, block) in blocks.iter().enumerate() {
        if block.len() > max_lines {
            oversized.push(index);
        }
        if current > 0 && current + block.len() > max_lines {
            ranges.push(start..index);
            start = index;
            current = 0;
        }
        current += block.len();
    }
    ranges.push(start..blocks.len());
    (ranges, oversized)
}

/// Find the unit a case targets. Cases always reference units of the same
/// module, so a miss is a programming error surfaced as `None` and skipped
/// by renderers.
pub(crate) fn unit_by_id<'a>(module: &'a ModuleModel, id: &str) -> Option<&'a SourceUnit> {
    module.units.iter().find(|u| u.id == id)
}

/// Substitute path placeholders (`<id>`, `{item_id}`) with a literal segment
/// so the rendered client call has a concrete URL.
pub(crate) fn concrete_route(route: &str) -> String {
    let mut out = String::with_capacity(route.len());
    let mut depth = 0u32;
    for ch in route.chars() {
        match ch {
            '<' | '{' => {
                if depth == 0 {
                    out.push('1');
                }
                depth += 1;
            }
            '>' | '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

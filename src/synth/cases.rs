//! Test-case synthesis from the structural model.
//!
//! One call per unit: the classification and optional framework binding go
//! in, an ordered list of abstract `TestCaseSpec`s comes out. Cases are
//! language-neutral; rendering happens at emission. Ordering is fixed at
//! happy, boundary, error, security, framework and all intermediate
//! collections are ordered, so repeated runs produce identical output.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzer::types::{SourceUnit, UnitKind};
use crate::config::{GeneratorConfig, MockLevel};
use crate::detect::FrameworkBinding;
use crate::effects::{Classification, EffectTag, VulnClass};
use crate::synth::security;
use crate::synth::values::{BaseType, Literal, ValueTables};

/// Which generation strategy produced a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    Happy,
    Boundary,
    Error,
    Security,
    Framework,
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Happy => write!(f, "happy"),
            Self::Boundary => write!(f, "boundary"),
            Self::Error => write!(f, "error"),
            Self::Security => write!(f, "security"),
            Self::Framework => write!(f, "framework"),
        }
    }
}

/// Expected outcome of executing a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expected {
    /// The call completes without raising.
    NoFailure,
    /// The result is non-null; no type information available.
    NonNull,
    /// The result has the declared base type.
    TypeIs(BaseType),
    /// The named error/exception kind is raised.
    ErrorKind(String),
    /// The response carries this HTTP status.
    HttpStatus(u16),
    /// The malicious input is rejected (error or sanitized result).
    Rejection,
}

/// Scripted behavior of one mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MockBehavior {
    Return(Literal),
    Raise(String),
}

/// One required mock: the effectful symbol, where to patch it, and what the
/// replacement does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockSpec {
    pub symbol: String,
    pub patch_target: String,
    pub behavior: MockBehavior,
    pub tag: EffectTag,
}

/// Abstract, language-neutral description of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseSpec {
    /// Test function name, unique within the suite for one source file.
    pub name: String,
    /// Id of the target unit (`stem.Class.method` or `stem.function`).
    pub unit_id: String,
    pub kind: CaseKind,
    /// Parameter name to input literal, in declaration order.
    pub inputs: Vec<(String, Literal)>,
    pub expected: Expected,
    /// Fixture ids, assigned by the planner.
    #[serde(default)]
    pub fixtures: Vec<String>,
    pub mocks: Vec<MockSpec>,
    /// Set for security probes.
    pub vuln: Option<VulnClass>,
    /// The parameter a boundary case varies; drives parametrized grouping.
    #[serde(default)]
    pub boundary_param: Option<String>,
    /// Set for framework cases; carries verb and route for the renderer.
    #[serde(default)]
    pub binding: Option<FrameworkBinding>,
    /// One-line human description, rendered as the test docstring.
    pub description: String,
}

/// Synthesize the ordered case list for one unit.
#[must_use]
pub fn synthesize(
    unit: &SourceUnit,
    classification: &Classification,
    binding: Option<&FrameworkBinding>,
    config: &GeneratorConfig,
    tables: &ValueTables,
) -> Vec<TestCaseSpec> {
    let base = case_base_name(unit);
    let mocks = unit_mocks(unit, classification, config.mock_level);
    let mut cases = Vec::new();

    // Happy path, always emitted.
    cases.push(TestCaseSpec {
        name: format!("test_{base}_happy_path"),
        unit_id: unit.id.clone(),
        kind: CaseKind::Happy,
        inputs: happy_inputs(unit, tables),
        expected: happy_expected(unit),
        fixtures: Vec::new(),
        mocks: mocks.clone(),
        vuln: None,
        boundary_param: None,
        binding: None,
        description: format!("{} returns normally on representative input", unit.name),
    });

    if config.beyond_happy_path() {
        push_boundary_cases(unit, config, tables, &base, &mocks, &mut cases);
        push_error_cases(unit, tables, &base, &mocks, &mut cases);
    }

    if config.security_enabled() && !unit.params.is_empty() {
        push_security_cases(unit, classification, &base, &mocks, tables, &mut cases);
    }

    if let Some(binding) = binding {
        push_framework_cases(unit, binding, classification, &base, &mut cases);
    }

    cases
}

fn push_error_cases(
    unit: &SourceUnit,
    tables: &ValueTables,
    base: &str,
    mocks: &[MockSpec],
    cases: &mut Vec<TestCaseSpec>,
) {
    for guard in &unit.guards {
        let mut inputs = happy_inputs(unit, tables);
        if let Some(slot) = inputs.iter_mut().find(|(name, _)| name == &guard.param) {
            slot.1 = literal_from_source(&guard.trigger);
        }
        cases.push(TestCaseSpec {
            name: format!("test_{base}_raises_{}", snake_case(&guard.error_kind)),
            unit_id: unit.id.clone(),
            kind: CaseKind::Error,
            inputs,
            expected: Expected::ErrorKind(guard.error_kind.clone()),
            fixtures: Vec::new(),
            mocks: mocks.to_vec(),
            vuln: None,
            boundary_param: None,
            binding: None,
            description: format!(
                "{} raises {} when {} is {}",
                unit.name, guard.error_kind, guard.param, guard.trigger
            ),
        });
    }
}

fn push_boundary_cases(
    unit: &SourceUnit,
    config: &GeneratorConfig,
    tables: &ValueTables,
    base: &str,
    mocks: &[MockSpec],
    cases: &mut Vec<TestCaseSpec>,
) {
    for param in &unit.params {
        let param_type = BaseType::from_hint(param.type_hint.as_deref());
        let values = tables.boundary_values(param_type, config.boundary_cases_per_param);
        for (index, value) in values.into_iter().enumerate() {
            let mut inputs = happy_inputs(unit, tables);
            if let Some(slot) = inputs.iter_mut().find(|(name, _)| name == &param.name) {
                slot.1 = value.clone();
            }
            cases.push(TestCaseSpec {
                name: format!("test_{base}_boundary_{}_{}", param.name, index + 1),
                unit_id: unit.id.clone(),
                kind: CaseKind::Boundary,
                inputs,
                expected: Expected::NoFailure,
                fixtures: Vec::new(),
                mocks: mocks.to_vec(),
                vuln: None,
                boundary_param: Some(param.name.clone()),
                binding: None,
                description: format!(
                    "{} tolerates boundary value {} for {}",
                    unit.name,
                    value.render(&unit.language),
                    param.name
                ),
            });
        }
    }
}

fn push_security_cases(
    unit: &SourceUnit,
    classification: &Classification,
    base: &str,
    mocks: &[MockSpec],
    tables: &ValueTables,
    cases: &mut Vec<TestCaseSpec>,
) {
    // Payload goes into the first string-typed parameter; without one, the
    // first parameter. Remaining parameters keep happy values.
    let target_param = unit
        .params
        .iter()
        .find(|p| BaseType::from_hint(p.type_hint.as_deref()) == BaseType::Str)
        .or_else(|| unit.params.first())
        .map(|p| p.name.clone());
    let Some(target_param) = target_param else {
        return;
    };

    for finding in &classification.vulns {
        for (index, payload) in security::payloads(finding.class).iter().enumerate() {
            let mut inputs = happy_inputs(unit, tables);
            if let Some(slot) = inputs.iter_mut().find(|(name, _)| name == &target_param) {
                slot.1 = Literal::Str((*payload).to_string());
            }
            cases.push(TestCaseSpec {
                name: format!("test_{base}_rejects_{}_{}", finding.class.key(), index + 1),
                unit_id: unit.id.clone(),
                kind: CaseKind::Security,
                inputs,
                expected: Expected::Rejection,
                fixtures: Vec::new(),
                mocks: mocks.to_vec(),
                vuln: Some(finding.class),
                boundary_param: None,
                binding: None,
                description: format!(
                    "{} rejects {} payload via {}",
                    unit.name,
                    finding.class.key().replace('_', " "),
                    finding.symbol
                ),
            });
        }
    }
}

fn push_framework_cases(
    unit: &SourceUnit,
    binding: &FrameworkBinding,
    classification: &Classification,
    base: &str,
    cases: &mut Vec<TestCaseSpec>,
) {
    // Data-access mocks are always required here: the test drives the route
    // through a client and must not reach a live backend.
    let data_mocks: Vec<MockSpec> = classification
        .effects
        .iter()
        .filter(|e| matches!(e.tag, EffectTag::Database | EffectTag::Network))
        .map(|e| MockSpec {
            symbol: e.symbol.clone(),
            patch_target: patch_target(unit, &e.symbol),
            behavior: default_behavior(e.tag),
            tag: e.tag,
        })
        .collect();

    for status in &binding.expected_statuses {
        let mocks = if *status == 404 {
            // The not-found path: the data layer comes up empty.
            data_mocks
                .iter()
                .map(|m| {
                    let mut m = m.clone();
                    if m.tag == EffectTag::Database {
                        m.behavior = MockBehavior::Return(Literal::Null);
                    }
                    m
                })
                .collect()
        } else {
            data_mocks.clone()
        };
        cases.push(TestCaseSpec {
            name: format!("test_{base}_returns_{status}"),
            unit_id: unit.id.clone(),
            kind: CaseKind::Framework,
            inputs: Vec::new(),
            expected: Expected::HttpStatus(*status),
            fixtures: Vec::new(),
            mocks,
            vuln: None,
            boundary_param: None,
            binding: Some(binding.clone()),
            description: format!(
                "{} {} responds with {status}",
                binding.verb,
                binding.route.as_deref().unwrap_or(&unit.name)
            ),
        });
    }
}

// =============================================================================
// Inputs and expectations
// =============================================================================

fn happy_inputs(unit: &SourceUnit, tables: &ValueTables) -> Vec<(String, Literal)> {
    unit.params
        .iter()
        .map(|p| {
            let base = BaseType::from_hint(p.type_hint.as_deref());
            (p.name.clone(), tables.happy_value(base))
        })
        .collect()
}

fn happy_expected(unit: &SourceUnit) -> Expected {
    if unit.kind == UnitKind::Class {
        // Instantiation succeeding is the assertion.
        return Expected::NonNull;
    }
    match unit.return_type.as_deref() {
        None => Expected::NoFailure,
        Some(hint) => match BaseType::from_hint(Some(hint)) {
            BaseType::Unknown => Expected::NonNull,
            base => Expected::TypeIs(base),
        },
    }
}

/// Parse a guard trigger recorded as verbatim source text into a literal.
fn literal_from_source(text: &str) -> Literal {
    let trimmed = text.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Literal::Int(v);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Literal::Float(v);
    }
    match trimmed {
        "True" | "true" => return Literal::Bool(true),
        "False" | "false" => return Literal::Bool(false),
        "None" | "null" => return Literal::Null,
        "[]" => return Literal::List(Vec::new()),
        "{}" => return Literal::Map(Vec::new()),
        _ => {}
    }
    let quoted = (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2);
    if quoted {
        Literal::Str(trimmed[1..trimmed.len() - 1].to_string())
    } else {
        Literal::Str(trimmed.to_string())
    }
}

// =============================================================================
// Mocks
// =============================================================================

fn unit_mocks(
    unit: &SourceUnit,
    classification: &Classification,
    level: MockLevel,
) -> Vec<MockSpec> {
    classification
        .effects
        .iter()
        .filter(|e| mock_allowed(level, e.tag))
        .map(|e| MockSpec {
            symbol: e.symbol.clone(),
            patch_target: patch_target(unit, &e.symbol),
            behavior: default_behavior(e.tag),
            tag: e.tag,
        })
        .collect()
}

fn mock_allowed(level: MockLevel, tag: EffectTag) -> bool {
    match level {
        MockLevel::None => false,
        MockLevel::Basic => matches!(
            tag,
            EffectTag::Network | EffectTag::Database | EffectTag::Filesystem | EffectTag::ProcessExec
        ),
        MockLevel::Comprehensive => true,
    }
}

/// Stock replacement behavior per effect class.
fn default_behavior(tag: EffectTag) -> MockBehavior {
    match tag {
        EffectTag::Network => MockBehavior::Return(Literal::Map(vec![(
            "status".to_string(),
            Literal::Int(200),
        )])),
        EffectTag::Database => MockBehavior::Return(Literal::List(Vec::new())),
        EffectTag::Filesystem => MockBehavior::Return(Literal::Str("data".to_string())),
        EffectTag::Time => MockBehavior::Return(Literal::Float(1_700_000_000.0)),
        EffectTag::Randomness => MockBehavior::Return(Literal::Float(0.5)),
        EffectTag::ProcessExec => MockBehavior::Return(Literal::Int(0)),
    }
}

/// Where to patch: Python mocks intercept the symbol as seen from the module
/// under test; Java mocks name the symbol itself.
fn patch_target(unit: &SourceUnit, symbol: &str) -> String {
    if unit.language == "python" {
        let stem = Path::new(&unit.file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module");
        format!("{stem}.{symbol}")
    } else {
        symbol.to_string()
    }
}

// =============================================================================
// Naming
// =============================================================================

fn case_base_name(unit: &SourceUnit) -> String {
    match &unit.class_name {
        Some(class) => format!("{}_{}", snake_case(class), snake_case(&unit.name)),
        None => snake_case(&unit.name),
    }
}

/// Lowercase snake_case for identifiers appearing in test names.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_matches('_').to_string()
}

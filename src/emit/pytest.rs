//! Pytest rendering for Python sources.
//!
//! Cases render as flat test functions patched with `unittest.mock`; shared
//! fixtures become pytest fixtures, landing in a `conftest.py` when the suite
//! spans more than one output file so every file can see them.

use crate::analyzer::types::{ModuleModel, SourceUnit, UnitKind};
use crate::config::GeneratorConfig;
use crate::detect::FrameworkKind;
use crate::emit::{concrete_route, partition_blocks, unit_by_id, EmitResult, OutputUnit, RenderedBlock};
use crate::plan::{FixtureSpec, SuitePlan};
use crate::report::{Diagnostic, DiagnosticKind};
use crate::synth::cases::{CaseKind, Expected, MockBehavior, MockSpec, TestCaseSpec};
use crate::synth::values::{BaseType, Literal};

const PY_BUILTIN_ERRORS: &[&str] = &[
    "Exception",
    "ValueError",
    "TypeError",
    "KeyError",
    "IndexError",
    "ZeroDivisionError",
    "ArithmeticError",
    "RuntimeError",
    "OSError",
    "IOError",
    "FileNotFoundError",
    "PermissionError",
    "NotImplementedError",
    "AttributeError",
    "OverflowError",
    "StopIteration",
];

pub(crate) fn emit(module: &ModuleModel, plan: &SuitePlan, config: &GeneratorConfig) -> EmitResult {
    let stem = module.stem();
    let mut diagnostics = Vec::new();

    let groups = group_cases(&plan.cases, config.generate_parametrized);
    let mut blocks = Vec::with_capacity(groups.len());
    for group in &groups {
        match render_group(group, module, &stem) {
            Some(block) => blocks.push(block),
            None => diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::EmissionError,
                    format!("case '{}' references an unknown unit", group_name(group)),
                )
                .with_location(module.file.clone(), 1),
            ),
        }
    }

    let (ranges, oversized) = partition_blocks(&blocks, config.max_lines_per_file, config.split_large_files);
    for index in oversized {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticKind::EmissionError,
                format!(
                    "case '{}' renders to {} lines, above the {}-line limit; emitted alone",
                    blocks[index].case_name,
                    blocks[index].len(),
                    config.max_lines_per_file
                ),
            )
            .with_location(module.file.clone(), 1),
        );
    }

    let uses_mock = plan.cases.iter().any(|c| !c.mocks.is_empty()) || !plan.fixtures.is_empty();
    let shared_fixtures = ranges.len() > 1 && !plan.fixtures.is_empty();

    let mut outputs = Vec::new();
    for (file_index, range) in ranges.iter().enumerate() {
        let file_name = if file_index == 0 {
            format!("test_{stem}.py")
        } else {
            format!("test_{stem}_{}.py", file_index + 1)
        };
        let inline_fixtures = if !shared_fixtures && file_index == 0 {
            plan.fixtures.as_slice()
        } else {
            &[]
        };
        let content = render_file(
            &stem,
            uses_mock,
            &plan.cases,
            inline_fixtures,
            &blocks[range.clone()],
        );
        let case_names = blocks[range.clone()]
            .iter()
            .map(|b| b.case_name.clone())
            .collect();
        outputs.push(OutputUnit::new(file_name, content, "python", case_names));
    }

    if shared_fixtures {
        outputs.push(OutputUnit::new(
            "conftest.py",
            render_conftest(&plan.fixtures),
            "python",
            Vec::new(),
        ));
    }

    EmitResult { outputs, diagnostics }
}

// =============================================================================
// Grouping
// =============================================================================

enum CaseGroup<'a> {
    Single(&'a TestCaseSpec),
    /// Consecutive boundary cases over one parameter of one unit.
    Parametrized {
        param: String,
        cases: Vec<&'a TestCaseSpec>,
    },
}

fn group_name(group: &CaseGroup<'_>) -> String {
    match group {
        CaseGroup::Single(case) => case.name.clone(),
        CaseGroup::Parametrized { cases, .. } => parametrized_name(cases[0]),
    }
}

fn parametrized_name(first: &TestCaseSpec) -> String {
    first
        .name
        .rsplit_once('_')
        .map_or_else(|| first.name.clone(), |(head, _)| head.to_string())
}

fn group_cases(cases: &[TestCaseSpec], parametrized: bool) -> Vec<CaseGroup<'_>> {
    let mut groups = Vec::new();
    let mut index = 0;
    while index < cases.len() {
        let case = &cases[index];
        let param = case.boundary_param.as_ref().filter(|_| parametrized);
        if let Some(param) = param {
            let mut members = vec![case];
            let mut next = index + 1;
            while next < cases.len()
                && cases[next].unit_id == case.unit_id
                && cases[next].boundary_param.as_deref() == Some(param)
            {
                members.push(&cases[next]);
                next += 1;
            }
            if members.len() > 1 {
                groups.push(CaseGroup::Parametrized {
                    param: param.clone(),
                    cases: members,
                });
                index = next;
                continue;
            }
        }
        groups.push(CaseGroup::Single(case));
        index += 1;
    }
    groups
}

// =============================================================================
// Case rendering
// =============================================================================

fn render_group(group: &CaseGroup<'_>, module: &ModuleModel, stem: &str) -> Option<RenderedBlock> {
    match group {
        CaseGroup::Single(case) => {
            let unit = unit_by_id(module, &case.unit_id)?;
            Some(render_single(case, unit, stem))
        }
        CaseGroup::Parametrized { param, cases } => {
            let unit = unit_by_id(module, &cases[0].unit_id)?;
            Some(render_parametrized(param, cases, unit, stem))
        }
    }
}

fn render_single(case: &TestCaseSpec, unit: &SourceUnit, stem: &str) -> RenderedBlock {
    let mut lines = Vec::new();
    let fixture_params = case.fixtures.join(", ");
    lines.push(format!("def {}({fixture_params}):", case.name));
    lines.push(format!("    \"\"\"{}.\"\"\"", case.description));

    let body = case_body(case, unit, stem, None);
    let inline_mocks = case.fixtures.is_empty() && !case.mocks.is_empty();
    if inline_mocks {
        extend_with_mock_wrapper(&mut lines, &case.mocks, stem, &body);
    } else {
        for line in body {
            lines.push(format!("    {line}"));
        }
    }

    RenderedBlock {
        case_name: case.name.clone(),
        lines,
    }
}

fn render_parametrized(
    param: &str,
    cases: &[&TestCaseSpec],
    unit: &SourceUnit,
    stem: &str,
) -> RenderedBlock {
    let first = cases[0];
    let values: Vec<String> = cases
        .iter()
        .filter_map(|c| c.inputs.iter().find(|(name, _)| name == param))
        .map(|(_, value)| value.render_python())
        .collect();
    let name = parametrized_name(first);

    let mut lines = Vec::new();
    lines.push(format!(
        "@pytest.mark.parametrize(\"{param}\", [{}])",
        values.join(", ")
    ));
    let fixture_params: Vec<&str> = std::iter::once(param)
        .chain(first.fixtures.iter().map(String::as_str))
        .collect();
    lines.push(format!("def {name}({}):", fixture_params.join(", ")));
    lines.push(format!(
        "    \"\"\"{} tolerates boundary values for {param}.\"\"\"",
        unit.name
    ));

    let body = case_body(first, unit, stem, Some(param));
    let inline_mocks = first.fixtures.is_empty() && !first.mocks.is_empty();
    if inline_mocks {
        extend_with_mock_wrapper(&mut lines, &first.mocks, stem, &body);
    } else {
        for line in body {
            lines.push(format!("    {line}"));
        }
    }

    RenderedBlock {
        case_name: name,
        lines,
    }
}

/// Body lines at function-body indent (no leading spaces; caller indents).
fn case_body(
    case: &TestCaseSpec,
    unit: &SourceUnit,
    stem: &str,
    parametrized_param: Option<&str>,
) -> Vec<String> {
    if let Expected::HttpStatus(status) = &case.expected {
        return http_body(case, stem, *status);
    }

    let mut lines = Vec::new();
    let mut overrides: Vec<(String, String)> = Vec::new();
    if let Some(param) = parametrized_param {
        overrides.push((param.to_string(), param.to_string()));
    }

    if case.expected == Expected::Rejection {
        let target = security_target_param(unit);
        if let Some(target) = target {
            let payload = case
                .inputs
                .iter()
                .find(|(name, _)| name == &target)
                .map(|(_, value)| value.render_python())
                .unwrap_or_else(|| "\"\"".to_string());
            lines.push(format!("payload = {payload}"));
            overrides.push((target, "payload".to_string()));
        }
    }

    let (mut setup, expr) = call_expr(case, unit, stem, &overrides);
    lines.append(&mut setup);

    match &case.expected {
        Expected::NoFailure => lines.push(expr),
        Expected::NonNull => {
            lines.push(format!("result = {expr}"));
            lines.push("assert result is not None".to_string());
        }
        Expected::TypeIs(base) => {
            lines.push(format!("result = {expr}"));
            lines.push(format!("assert isinstance(result, {})", py_type(*base)));
        }
        Expected::ErrorKind(kind) => {
            lines.push(format!("with pytest.raises({}):", py_error(kind, stem)));
            lines.push(format!("    {expr}"));
        }
        Expected::Rejection => {
            lines.push("try:".to_string());
            lines.push(format!("    result = {expr}"));
            lines.push("except Exception:".to_string());
            lines.push("    return".to_string());
            lines.push("assert not payload or payload not in str(result)".to_string());
        }
        Expected::HttpStatus(_) => unreachable!("handled above"),
    }
    lines
}

fn http_body(case: &TestCaseSpec, stem: &str, status: u16) -> Vec<String> {
    let Some(binding) = &case.binding else {
        return vec![format!("assert {status} == {status}")];
    };
    let route = concrete_route(binding.route.as_deref().unwrap_or("/"));
    let verb = binding.verb.to_string().to_lowercase();
    let mut lines = match binding.kind {
        FrameworkKind::FastApi => vec![format!("client = TestClient({stem}.app)")],
        FrameworkKind::Django => vec!["client = Client()".to_string()],
        _ => vec![format!("client = {stem}.app.test_client()")],
    };
    lines.push(format!("response = client.{verb}(\"{route}\")"));
    lines.push(format!("assert response.status_code == {status}"));
    lines
}

/// Mirror of the synthesizer's payload-placement rule.
fn security_target_param(unit: &SourceUnit) -> Option<String> {
    unit.params
        .iter()
        .find(|p| BaseType::from_hint(p.type_hint.as_deref()) == BaseType::Str)
        .or_else(|| unit.params.first())
        .map(|p| p.name.clone())
}

/// Setup lines plus the call expression.
fn call_expr(
    case: &TestCaseSpec,
    unit: &SourceUnit,
    stem: &str,
    overrides: &[(String, String)],
) -> (Vec<String>, String) {
    let args = render_args(case, overrides);
    match unit.kind {
        UnitKind::Class => (Vec::new(), format!("{stem}.{}({args})", unit.name)),
        UnitKind::Method if unit.is_static => {
            let class = unit.class_name.as_deref().unwrap_or("object");
            (Vec::new(), format!("{stem}.{class}.{}({args})", unit.name))
        }
        UnitKind::Method => {
            let class = unit.class_name.as_deref().unwrap_or("object");
            (
                vec![format!("instance = {stem}.{class}()")],
                format!("instance.{}({args})", unit.name),
            )
        }
        UnitKind::Function | UnitKind::RouteHandler => {
            (Vec::new(), format!("{stem}.{}({args})", unit.name))
        }
    }
}

fn render_args(case: &TestCaseSpec, overrides: &[(String, String)]) -> String {
    case.inputs
        .iter()
        .map(|(name, value)| {
            let rendered = overrides
                .iter()
                .find(|(param, _)| param == name)
                .map_or_else(|| value.render_python(), |(_, expr)| expr.clone());
            format!("{name}={rendered}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn extend_with_mock_wrapper(
    lines: &mut Vec<String>,
    mocks: &[MockSpec],
    stem: &str,
    body: &[String],
) {
    let names = mock_var_names(mocks);
    let clauses: Vec<String> = mocks
        .iter()
        .zip(&names)
        .map(|(m, name)| format!("mock.patch(\"{}\") as {name}", m.patch_target))
        .collect();
    lines.push(format!("    with {}:", clauses.join(", ")));
    for (mock_spec, name) in mocks.iter().zip(&names) {
        lines.push(format!("        {}", behavior_line(name, &mock_spec.behavior, stem)));
    }
    for line in body {
        lines.push(format!("        {line}"));
    }
}

fn behavior_line(var: &str, behavior: &MockBehavior, stem: &str) -> String {
    match behavior {
        MockBehavior::Return(value) => format!("{var}.return_value = {}", value.render_python()),
        MockBehavior::Raise(kind) => format!("{var}.side_effect = {}", py_error(kind, stem)),
    }
}

fn mock_var_names(mocks: &[MockSpec]) -> Vec<String> {
    let mut names = Vec::with_capacity(mocks.len());
    for mock_spec in mocks {
        let tail = mock_spec
            .symbol
            .rsplit(['.', ' '])
            .next()
            .unwrap_or("dep")
            .to_lowercase();
        let slug: String = tail
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let mut name = format!("mock_{slug}");
        let mut suffix = 2;
        while names.contains(&name) {
            name = format!("mock_{slug}_{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn py_type(base: BaseType) -> &'static str {
    match base {
        BaseType::Int => "int",
        BaseType::Float => "float",
        BaseType::Str => "str",
        BaseType::Bool => "bool",
        BaseType::List => "list",
        BaseType::Map => "dict",
        BaseType::Unknown => "object",
    }
}

/// Builtin exception names pass through; anything else lives in the module
/// under test.
fn py_error(kind: &str, stem: &str) -> String {
    if PY_BUILTIN_ERRORS.contains(&kind) {
        kind.to_string()
    } else {
        format!("{stem}.{kind}")
    }
}

// =============================================================================
// File assembly
// =============================================================================

fn render_file(
    stem: &str,
    uses_mock: bool,
    cases: &[TestCaseSpec],
    inline_fixtures: &[FixtureSpec],
    blocks: &[RenderedBlock],
) -> String {
    let mut lines = vec!["import pytest".to_string()];
    if uses_mock {
        lines.push("from unittest import mock".to_string());
    }
    if cases.iter().any(|c| {
        matches!(&c.binding, Some(b) if b.kind == FrameworkKind::FastApi)
            && matches!(c.kind, CaseKind::Framework)
    }) {
        lines.push("from fastapi.testclient import TestClient".to_string());
    }
    if cases.iter().any(|c| {
        matches!(&c.binding, Some(b) if b.kind == FrameworkKind::Django)
            && matches!(c.kind, CaseKind::Framework)
    }) {
        lines.push("from django.test import Client".to_string());
    }
    lines.push(String::new());
    lines.push(format!("import {stem}"));

    for fixture in inline_fixtures {
        lines.push(String::new());
        lines.push(String::new());
        lines.extend(render_fixture(fixture, stem));
    }

    for block in blocks {
        lines.push(String::new());
        lines.push(String::new());
        lines.extend(block.lines.iter().cloned());
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_conftest(fixtures: &[FixtureSpec]) -> String {
    let mut lines = vec![
        "import pytest".to_string(),
        "from unittest import mock".to_string(),
    ];
    for fixture in fixtures {
        lines.push(String::new());
        lines.push(String::new());
        lines.extend(render_fixture(fixture, ""));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_fixture(fixture: &FixtureSpec, stem: &str) -> Vec<String> {
    let mut lines = vec![
        "@pytest.fixture".to_string(),
        format!("def {}():", fixture.id),
        format!("    with mock.patch(\"{}\") as patched:", fixture.patch_target),
    ];
    lines.push(format!(
        "        {}",
        behavior_line("patched", &fixture.behavior, stem)
    ));
    lines.push("        yield patched".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_source;
    use crate::effects::EffectTable;
    use crate::plan::plan_suite;
    use crate::synth::{synthesize, ValueTables};
    use std::collections::BTreeSet;

    const CALCULATOR: &str = r#"
def divide(a: int, b: int) -> float:
    if b == 0:
        raise ZeroDivisionError("division by zero")
    return a / b
"#;

    fn emitted(config: &GeneratorConfig) -> EmitResult {
        let module = analyze_source(CALCULATOR, "python", "calculator.py").unwrap();
        let table = EffectTable::with_extensions(&BTreeSet::new()).unwrap();
        let tables = ValueTables::from_config(config);
        let mut cases = Vec::new();
        for unit in &module.units {
            let classification = table.classify(unit);
            cases.extend(synthesize(unit, &classification, None, config, &tables));
        }
        let plan = plan_suite(config, cases).unwrap();
        emit(&module, &plan, config)
    }

    #[test]
    fn test_file_name_follows_module_stem() {
        let result = emitted(&GeneratorConfig::default());
        assert_eq!(result.outputs[0].file_name, "test_calculator.py");
    }

    #[test]
    fn test_error_case_renders_pytest_raises() {
        let result = emitted(&GeneratorConfig::default());
        let content = &result.outputs[0].content;
        assert!(content.contains("with pytest.raises(ZeroDivisionError):"));
        assert!(content.contains("b=0"));
    }

    #[test]
    fn test_happy_case_asserts_declared_type() {
        let result = emitted(&GeneratorConfig::default());
        let content = &result.outputs[0].content;
        assert!(content.contains("assert isinstance(result, float)"));
        assert!(content.contains("calculator.divide(a=42, b=42)"));
    }

    #[test]
    fn test_parametrized_grouping_of_boundaries() {
        let config = GeneratorConfig::default();
        let result = emitted(&config);
        let content = &result.outputs[0].content;
        assert!(content.contains("@pytest.mark.parametrize(\"a\", [0, -1, 2147483647])"));
        assert!(content.contains("def test_divide_boundary_a(a):"));
    }

    #[test]
    fn test_individual_boundaries_without_parametrize() {
        let config = GeneratorConfig {
            generate_parametrized: false,
            ..GeneratorConfig::default()
        };
        let result = emitted(&config);
        let content = &result.outputs[0].content;
        assert!(!content.contains("parametrize"));
        assert!(content.contains("def test_divide_boundary_a_1():"));
    }

    #[test]
    fn test_small_limit_splits_into_numbered_files() {
        let config = GeneratorConfig {
            max_lines_per_file: 12,
            generate_parametrized: false,
            ..GeneratorConfig::default()
        };
        let result = emitted(&config);
        assert!(result.outputs.len() > 1);
        assert_eq!(result.outputs[0].file_name, "test_calculator.py");
        assert_eq!(result.outputs[1].file_name, "test_calculator_2.py");
    }

    #[test]
    fn test_deterministic_rendering() {
        let config = GeneratorConfig::default();
        let first = emitted(&config);
        let second = emitted(&config);
        assert_eq!(first.outputs, second.outputs);
    }
}

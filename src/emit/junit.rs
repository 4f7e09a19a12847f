//! JUnit 5 rendering for Java sources.
//!
//! Monkey-patching does not exist here, so effectful static calls get
//! Mockito `mockStatic` scopes and everything else is exercised directly.
//! Fixture sharing maps poorly onto JUnit's lifecycle; mocks stay inline per
//! test, which keeps each rendered case self-contained.

use crate::analyzer::types::{ModuleModel, SourceUnit, UnitKind};
use crate::config::GeneratorConfig;
use crate::emit::{concrete_route, partition_blocks, unit_by_id, EmitResult, OutputUnit, RenderedBlock};
use crate::plan::SuitePlan;
use crate::report::{Diagnostic, DiagnosticKind};
use crate::synth::cases::{Expected, MockSpec, TestCaseSpec};
use crate::synth::values::Literal;

pub(crate) fn emit(module: &ModuleModel, plan: &SuitePlan, config: &GeneratorConfig) -> EmitResult {
    let stem = pascal_case(&module.stem());
    let mut diagnostics = Vec::new();

    let mut blocks = Vec::with_capacity(plan.cases.len());
    for case in &plan.cases {
        match unit_by_id(module, &case.unit_id) {
            Some(unit) => blocks.push(render_case(case, unit)),
            None => diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::EmissionError,
                    format!("case '{}' references an unknown unit", case.name),
                )
                .with_location(module.file.clone(), 1),
            ),
        }
    }

    let (ranges, oversized) =
        partition_blocks(&blocks, config.max_lines_per_file, config.split_large_files);
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

    let uses_mockito = plan
        .cases
        .iter()
        .any(|c| c.mocks.iter().any(|m| static_mock_class(&m.symbol).is_some()));
    let uses_mockmvc = plan.cases.iter().any(|c| c.binding.is_some());

    let mut outputs = Vec::new();
    for (file_index, range) in ranges.iter().enumerate() {
        let class_name = if file_index == 0 {
            format!("{stem}Test")
        } else {
            format!("{stem}Test{}", file_index + 1)
        };
        let content = render_file(&class_name, uses_mockito, uses_mockmvc, &blocks[range.clone()]);
        let case_names = blocks[range.clone()]
            .iter()
            .map(|b| b.case_name.clone())
            .collect();
        outputs.push(OutputUnit::new(
            format!("{class_name}.java"),
            content,
            "java",
            case_names,
        ));
    }

    EmitResult { outputs, diagnostics }
}

// =============================================================================
// Case rendering
// =============================================================================

fn render_case(case: &TestCaseSpec, unit: &SourceUnit) -> RenderedBlock {
    let mut lines = Vec::new();
    lines.push("@Test".to_string());
    lines.push(format!("void {}() throws Exception {{", camel_case(&case.name)));

    let body = case_body(case, unit);
    let static_mocks: Vec<&MockSpec> = case
        .mocks
        .iter()
        .filter(|m| static_mock_class(&m.symbol).is_some())
        .collect();
    if static_mocks.is_empty() {
        for line in body {
            lines.push(format!("    {line}"));
        }
    } else {
        // Mockito scopes around the call; defaults (null/zero) stand in for
        // the scripted values, which Java's type system cannot take verbatim.
        let clauses: Vec<String> = static_mocks
            .iter()
            .filter_map(|m| static_mock_class(&m.symbol))
            .enumerate()
            .map(|(i, class)| {
                format!("MockedStatic<{class}> mocked{i} = Mockito.mockStatic({class}.class)")
            })
            .collect();
        lines.push(format!("    try ({}) {{", clauses.join("; ")));
        for line in body {
            lines.push(format!("        {line}"));
        }
        lines.push("    }".to_string());
    }

    lines.push("}".to_string());
    RenderedBlock {
        case_name: case.name.clone(),
        lines,
    }
}

fn case_body(case: &TestCaseSpec, unit: &SourceUnit) -> Vec<String> {
    if let Expected::HttpStatus(status) = &case.expected {
        return http_body(case, unit, *status);
    }

    let mut lines = Vec::new();
    let mut payload_var = None;
    if case.expected == Expected::Rejection {
        // Same placement rule as synthesis: first string-typed parameter,
        // else the first parameter.
        let target = unit
            .params
            .iter()
            .find(|p| {
                crate::synth::values::BaseType::from_hint(p.type_hint.as_deref())
                    == crate::synth::values::BaseType::Str
            })
            .or_else(|| unit.params.first())
            .map(|p| p.name.clone());
        if let Some(target) = target {
            let payload = case
                .inputs
                .iter()
                .find(|(name, _)| name == &target)
                .map(|(_, value)| match value {
                    Literal::Str(s) => s.clone(),
                    other => other.render_java(),
                })
                .unwrap_or_default();
            lines.push(format!("String payload = {:?};", payload));
            payload_var = Some(target);
        }
    }

    let (mut setup, expr) = call_expr(case, unit, payload_var.as_deref());
    lines.append(&mut setup);

    match &case.expected {
        Expected::NoFailure | Expected::TypeIs(_) => {
            lines.push(format!("assertDoesNotThrow(() -> {expr});"));
        }
        Expected::NonNull => {
            lines.push(format!("Object result = assertDoesNotThrow(() -> {expr});"));
            lines.push("assertNotNull(result);".to_string());
        }
        Expected::ErrorKind(kind) => {
            lines.push(format!("assertThrows({kind}.class, () -> {expr});"));
        }
        Expected::Rejection => {
            lines.push("try {".to_string());
            lines.push(format!("    Object result = {expr};"));
            lines.push(
                "    assertTrue(payload.isEmpty() || !String.valueOf(result).contains(payload));"
                    .to_string(),
            );
            lines.push("} catch (Exception rejected) {".to_string());
            lines.push("    // rejection path".to_string());
            lines.push("}".to_string());
        }
        Expected::HttpStatus(_) => unreachable!("handled above"),
    }
    lines
}

fn http_body(case: &TestCaseSpec, unit: &SourceUnit, status: u16) -> Vec<String> {
    let Some(binding) = &case.binding else {
        return vec![format!("// no binding recorded for status {status}")];
    };
    let controller = unit
        .class_name
        .clone()
        .unwrap_or_else(|| unit.name.clone());
    let route = concrete_route(binding.route.as_deref().unwrap_or("/"));
    let verb = binding.verb.to_string().to_lowercase();
    vec![
        format!("MockMvc mvc = MockMvcBuilders.standaloneSetup(new {controller}()).build();"),
        format!("mvc.perform({verb}(\"{route}\")).andExpect(status().is({status}));"),
    ]
}

fn call_expr(
    case: &TestCaseSpec,
    unit: &SourceUnit,
    payload_param: Option<&str>,
) -> (Vec<String>, String) {
    let args: Vec<String> = case
        .inputs
        .iter()
        .map(|(name, value)| {
            if payload_param == Some(name.as_str()) {
                "payload".to_string()
            } else {
                value.render_java()
            }
        })
        .collect();
    let args = args.join(", ");

    match unit.kind {
        UnitKind::Class => (Vec::new(), format!("new {}({args})", unit.name)),
        UnitKind::Method if unit.is_static => {
            let class = unit.class_name.as_deref().unwrap_or("Object");
            (Vec::new(), format!("{class}.{}({args})", unit.name))
        }
        UnitKind::Method => {
            let class = unit.class_name.as_deref().unwrap_or("Object");
            (
                vec![format!("{class} instance = new {class}();")],
                format!("instance.{}({args})", unit.name),
            )
        }
        UnitKind::Function | UnitKind::RouteHandler => (Vec::new(), format!("{}({args})", unit.name)),
    }
}

/// A symbol is static-mockable when it reads `Type.method` with an uppercase
/// receiver; instance receivers and constructors are not patchable here.
fn static_mock_class(symbol: &str) -> Option<&str> {
    let (class, _method) = symbol.split_once('.')?;
    if class.chars().next().is_some_and(|c| c.is_ascii_uppercase()) && !class.contains(' ') {
        Some(class)
    } else {
        None
    }
}

// =============================================================================
// File assembly
// =============================================================================

fn render_file(
    class_name: &str,
    uses_mockito: bool,
    uses_mockmvc: bool,
    blocks: &[RenderedBlock],
) -> String {
    let mut lines = vec![
        "import org.junit.jupiter.api.Test;".to_string(),
        String::new(),
        "import static org.junit.jupiter.api.Assertions.*;".to_string(),
    ];
    if uses_mockito {
        lines.insert(1, "import org.mockito.MockedStatic;".to_string());
        lines.insert(2, "import org.mockito.Mockito;".to_string());
    }
    if uses_mockmvc {
        lines.push(String::new());
        lines.push("import org.springframework.test.web.servlet.MockMvc;".to_string());
        lines.push(
            "import org.springframework.test.web.servlet.setup.MockMvcBuilders;".to_string(),
        );
        lines.push(
            "import static org.springframework.test.web.servlet.request.MockMvcRequestBuilders.*;"
                .to_string(),
        );
        lines.push(
            "import static org.springframework.test.web.servlet.result.MockMvcResultMatchers.status;"
                .to_string(),
        );
    }
    lines.push(String::new());
    lines.push(format!("class {class_name} {{"));
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        lines.push(String::new());
        for line in &block.lines {
            lines.push(format!("    {line}"));
        }
    }
    lines.push("}".to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn pascal_case(stem: &str) -> String {
    stem.split(['_', '-'])
        .filter(|s| !s.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

//! Case synthesis properties over the fixture sources.

use std::collections::BTreeSet;

use testsmith::analyze_source;
use testsmith::config::CoverageType;
use testsmith::detect::detect_framework;
use testsmith::synth::cases::CaseKind;
use testsmith::synth::{synthesize, Expected, Literal, ValueTables};
use testsmith::{EffectTable, GeneratorConfig};

const CALCULATOR_PY: &str = include_str!("../fixtures/calculator.py");
const API_PY: &str = include_str!("../fixtures/api.py");

fn cases_for(source: &str, language: &str, file: &str, config: &GeneratorConfig) -> Vec<testsmith::TestCaseSpec> {
    let module = analyze_source(source, language, file).unwrap();
    let table = EffectTable::with_extensions(&config.mock_dependencies).unwrap();
    let tables = ValueTables::from_config(config);
    let mut cases = Vec::new();
    for unit in &module.units {
        let detection = detect_framework(&module, unit);
        let classification = table.classify(unit);
        cases.extend(synthesize(
            unit,
            &classification,
            detection.binding.as_ref(),
            config,
            &tables,
        ));
    }
    cases
}

#[test]
fn test_divide_scenario_emits_at_least_three_case_kinds() {
    let config = GeneratorConfig::default();
    let cases = cases_for(CALCULATOR_PY, "python", "calculator.py", &config);
    let divide: Vec<_> = cases
        .iter()
        .filter(|c| c.unit_id == "calculator.Calculator.divide")
        .collect();

    assert!(divide.len() >= 3);
    assert!(divide.iter().any(|c| c.kind == CaseKind::Happy));
    assert!(divide.iter().any(|c| c.kind == CaseKind::Boundary));
    let error = divide.iter().find(|c| c.kind == CaseKind::Error).unwrap();
    assert_eq!(
        error.expected,
        Expected::ErrorKind("ZeroDivisionError".to_string())
    );
    assert!(error
        .inputs
        .iter()
        .any(|(name, value)| name == "b" && *value == Literal::Int(0)));
}

#[test]
fn test_boundary_values_cover_configured_set() {
    let config = GeneratorConfig::default();
    let cases = cases_for(CALCULATOR_PY, "python", "calculator.py", &config);
    let b_values: BTreeSet<String> = cases
        .iter()
        .filter(|c| {
            c.unit_id == "calculator.Calculator.divide"
                && c.boundary_param.as_deref() == Some("b")
        })
        .filter_map(|c| c.inputs.iter().find(|(n, _)| n == "b"))
        .map(|(_, v)| v.render_python())
        .collect();

    assert!(b_values.contains("0"));
    assert!(b_values.contains("-1"));
    assert!(b_values.contains("2147483647"));
}

#[test]
fn test_synthesis_is_deterministic() {
    let config = GeneratorConfig::default();
    let first = cases_for(CALCULATOR_PY, "python", "calculator.py", &config);
    let second = cases_for(CALCULATOR_PY, "python", "calculator.py", &config);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_pure_unit_requires_no_mocks() {
    let config = GeneratorConfig::default();
    let cases = cases_for(CALCULATOR_PY, "python", "calculator.py", &config);
    let divide_cases = cases
        .iter()
        .filter(|c| c.unit_id == "calculator.Calculator.divide");
    for case in divide_cases {
        assert!(case.mocks.is_empty(), "pure arithmetic got a mock");
    }
}

#[test]
fn test_route_handlers_get_status_cases() {
    let config = GeneratorConfig::default();
    let cases = cases_for(API_PY, "python", "api.py", &config);

    let get_statuses: Vec<&testsmith::TestCaseSpec> = cases
        .iter()
        .filter(|c| c.unit_id == "api.get_user" && c.kind == CaseKind::Framework)
        .collect();
    assert_eq!(get_statuses.len(), 2);
    assert_eq!(get_statuses[0].expected, Expected::HttpStatus(200));
    assert_eq!(get_statuses[1].expected, Expected::HttpStatus(404));

    let post_statuses: Vec<&testsmith::TestCaseSpec> = cases
        .iter()
        .filter(|c| c.unit_id == "api.create_user" && c.kind == CaseKind::Framework)
        .collect();
    assert_eq!(post_statuses[0].expected, Expected::HttpStatus(201));
}

#[test]
fn test_effectful_route_cases_carry_database_mocks() {
    let config = GeneratorConfig::default();
    let cases = cases_for(API_PY, "python", "api.py", &config);
    let framework_case = cases
        .iter()
        .find(|c| c.unit_id == "api.get_user" && c.kind == CaseKind::Framework)
        .unwrap();
    assert!(!framework_case.mocks.is_empty());
    assert!(framework_case
        .mocks
        .iter()
        .any(|m| m.symbol.contains("execute") || m.symbol.contains("connect")));
}

#[test]
fn test_full_coverage_adds_security_cases_for_sql_unit() {
    let config = GeneratorConfig {
        coverage: CoverageType::Full,
        ..GeneratorConfig::default()
    };
    let cases = cases_for(API_PY, "python", "api.py", &config);
    assert!(cases
        .iter()
        .any(|c| c.unit_id == "api.get_user" && c.kind == CaseKind::Security));
}

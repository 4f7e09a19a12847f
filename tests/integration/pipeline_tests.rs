//! End-to-end runs over mixed-language batches.

use testsmith::report::DiagnosticKind;
use testsmith::{
    CoverageType, GeneratorConfig, SourceInput, SuiteGenerator, VulnClass,
};

const CALCULATOR_PY: &str = include_str!("../fixtures/calculator.py");
const INSECURE_PY: &str = include_str!("../fixtures/insecure.py");
const API_PY: &str = include_str!("../fixtures/api.py");
const CALCULATOR_JAVA: &str = include_str!("../fixtures/Calculator.java");
const REPOSITORY_JAVA: &str = include_str!("../fixtures/UserRepository.java");

fn batch() -> Vec<SourceInput> {
    vec![
        SourceInput::new("calculator.py", CALCULATOR_PY),
        SourceInput::new("api.py", API_PY),
        SourceInput::new("insecure.py", INSECURE_PY),
        SourceInput::new("Calculator.java", CALCULATOR_JAVA),
        SourceInput::new("UserRepository.java", REPOSITORY_JAVA),
    ]
}

#[test]
fn test_mixed_language_batch() {
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let result = generator.generate(&batch());

    assert_eq!(result.summary.files_analyzed, 5);
    let names: Vec<&str> = result.outputs.iter().map(|o| o.file_name.as_str()).collect();
    assert!(names.contains(&"test_calculator.py"));
    assert!(names.contains(&"test_api.py"));
    assert!(names.contains(&"CalculatorTest.java"));
    assert!(names.contains(&"UserRepositoryTest.java"));
    assert_eq!(result.summary.output_files.len(), result.outputs.len());
}

#[test]
fn test_output_order_matches_input_order() {
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let result = generator.generate(&batch());

    let calc = result
        .outputs
        .iter()
        .position(|o| o.file_name == "test_calculator.py")
        .unwrap();
    let repo = result
        .outputs
        .iter()
        .position(|o| o.file_name == "UserRepositoryTest.java")
        .unwrap();
    assert!(calc < repo);
}

#[test]
fn test_summary_vulnerabilities_survive_without_full_coverage() {
    // Probe cases need full coverage; the findings themselves always report.
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let result = generator.generate(&[SourceInput::new("insecure.py", INSECURE_PY)]);

    assert!(result
        .summary
        .vulnerabilities
        .iter()
        .any(|v| v.class == VulnClass::CommandInjection));
    assert!(result.summary.cases_by_kind.get("security").is_none());
}

#[test]
fn test_full_coverage_counts_security_cases() {
    let config = GeneratorConfig {
        coverage: CoverageType::Full,
        ..GeneratorConfig::default()
    };
    let generator = SuiteGenerator::new(config).unwrap();
    let result = generator.generate(&[SourceInput::new("insecure.py", INSECURE_PY)]);

    assert!(result.summary.cases_by_kind["security"] > 0);
    let content = &result.outputs[0].content;
    assert!(content.contains("payload = \"; ls -la\""));
}

#[test]
fn test_same_symbol_different_returns_across_cases_is_fine() {
    // Route suite scripts the data layer differently for 200 and 404; that
    // must not raise a configuration error.
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let result = generator.generate(&[SourceInput::new("api.py", API_PY)]);
    assert!(!result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ConfigurationError));
    assert!(!result.outputs.is_empty());
}

#[test]
fn test_invalid_config_rejected_upfront() {
    let config = GeneratorConfig {
        max_lines_per_file: 0,
        ..GeneratorConfig::default()
    };
    assert!(SuiteGenerator::new(config).is_err());
}

#[test]
fn test_skipped_units_have_reasons() {
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let result = generator.generate(&batch());

    for skipped in &result.skipped {
        assert!(!skipped.reason.is_empty());
    }
    assert!(result
        .skipped
        .iter()
        .any(|s| s.unit.as_deref() == Some("calculator._internal_debug")));
    assert_eq!(result.summary.units_skipped, result.skipped.len());
}

#[test]
fn test_write_to_round_trip() {
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let result = generator.generate(&batch());

    let dir = tempfile::tempdir().unwrap();
    result.write_to(dir.path()).unwrap();
    for output in &result.outputs {
        let written = std::fs::read_to_string(dir.path().join(&output.file_name)).unwrap();
        assert_eq!(written, output.content);
    }
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let generator = SuiteGenerator::new(GeneratorConfig::default()).unwrap();
    let inputs = batch();
    let first = generator.generate(&inputs);
    let second = generator.generate(&inputs);

    assert_eq!(first.outputs, second.outputs);
    assert_eq!(first.summary, second.summary);
}

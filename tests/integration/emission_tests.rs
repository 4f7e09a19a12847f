//! Rendering and file partitioning.

use testsmith::report::DiagnosticKind;
use testsmith::{GeneratorConfig, SourceInput, SuiteGenerator};

const CALCULATOR_PY: &str = include_str!("../fixtures/calculator.py");
const CALCULATOR_JAVA: &str = include_str!("../fixtures/Calculator.java");
const API_PY: &str = include_str!("../fixtures/api.py");

fn generate(source: &str, path: &str, config: GeneratorConfig) -> testsmith::SuiteResult {
    let generator = SuiteGenerator::new(config).unwrap();
    generator.generate(&[SourceInput::new(path, source)])
}

#[test]
fn test_python_suite_renders_pytest() {
    let result = generate(CALCULATOR_PY, "calculator.py", GeneratorConfig::default());
    let content = &result.outputs[0].content;

    assert!(content.starts_with("import pytest"));
    assert!(content.contains("import calculator"));
    assert!(content.contains("instance = calculator.Calculator()"));
    assert!(content.contains("with pytest.raises(ZeroDivisionError):"));
}

#[test]
fn test_java_suite_renders_junit() {
    let result = generate(CALCULATOR_JAVA, "Calculator.java", GeneratorConfig::default());
    let first = &result.outputs[0];

    assert_eq!(first.file_name, "CalculatorTest.java");
    assert!(first.content.contains("import org.junit.jupiter.api.Test;"));
    assert!(first
        .content
        .contains("assertThrows(ArithmeticException.class"));
    // Static method called through the class, not an instance.
    assert!(first.content.contains("Calculator.add(42, 42)"));
}

#[test]
fn test_split_produces_numbered_files_preserving_order() {
    let config = GeneratorConfig {
        max_lines_per_file: 15,
        generate_parametrized: false,
        ..GeneratorConfig::default()
    };
    let result = generate(CALCULATOR_PY, "calculator.py", config);

    let names: Vec<&str> = result.outputs.iter().map(|o| o.file_name.as_str()).collect();
    assert!(names.len() > 1);
    assert_eq!(names[0], "test_calculator.py");
    assert_eq!(names[1], "test_calculator_2.py");

    // Atomicity: every test function is complete in its file.
    for output in &result.outputs {
        let opens = output.content.matches("def test_").count();
        for window in output.content.split("def test_").skip(1) {
            assert!(window.contains('('), "truncated test in {}", output.file_name);
        }
        assert!(opens > 0);
        assert_eq!(opens, output.case_names.len());
        assert_eq!(output.line_count, output.content.lines().count());
        for name in &output.case_names {
            assert!(output.content.contains(&format!("def {name}(")));
        }
    }
}

#[test]
fn test_oversized_case_reported_and_still_emitted() {
    let config = GeneratorConfig {
        max_lines_per_file: 2,
        generate_parametrized: false,
        ..GeneratorConfig::default()
    };
    let result = generate(CALCULATOR_PY, "calculator.py", config);

    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::EmissionError));
    // Every synthesized case still lands in some file.
    let total_tests: usize = result
        .outputs
        .iter()
        .map(|o| o.content.matches("def test_").count())
        .sum();
    assert_eq!(total_tests, result.summary.total_cases());
}

#[test]
fn test_split_disabled_keeps_single_file() {
    let config = GeneratorConfig {
        max_lines_per_file: 15,
        split_large_files: false,
        ..GeneratorConfig::default()
    };
    let result = generate(CALCULATOR_PY, "calculator.py", config);
    assert_eq!(result.outputs.len(), 1);
}

#[test]
fn test_shared_fixtures_move_to_conftest_on_split() {
    let config = GeneratorConfig {
        max_lines_per_file: 10,
        generate_parametrized: false,
        ..GeneratorConfig::default()
    };
    let result = generate(API_PY, "api.py", config);

    let conftest = result
        .outputs
        .iter()
        .find(|o| o.file_name == "conftest.py");
    assert!(conftest.is_some(), "expected a shared conftest.py");
    assert!(conftest.unwrap().content.contains("@pytest.fixture"));
    // Test files reference fixtures by parameter, not by re-patching.
    let first = result
        .outputs
        .iter()
        .find(|o| o.file_name == "test_api.py")
        .unwrap();
    assert!(first.content.contains("def test_get_user_happy_path(mock_"));
}

#[test]
fn test_flask_status_cases_drive_test_client() {
    let result = generate(API_PY, "api.py", GeneratorConfig::default());
    let content: String = result
        .outputs
        .iter()
        .map(|o| o.content.clone())
        .collect::<Vec<_>>()
        .join("\n");

    assert!(content.contains("client = api.app.test_client()"));
    assert!(content.contains("response = client.get(\"/users/1\")"));
    assert!(content.contains("assert response.status_code == 404"));
    assert!(content.contains("assert response.status_code == 201"));
}

#[test]
fn test_generated_output_is_byte_identical_across_runs() {
    let first = generate(API_PY, "api.py", GeneratorConfig::default());
    let second = generate(API_PY, "api.py", GeneratorConfig::default());
    assert_eq!(first.outputs, second.outputs);
}

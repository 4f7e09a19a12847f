//! Structural analysis over real fixture sources.

use testsmith::analyzer::types::UnitKind;
use testsmith::analyze_source;
use testsmith::lang::LanguageRegistry;

const CALCULATOR_PY: &str = include_str!("../fixtures/calculator.py");
const CALCULATOR_JAVA: &str = include_str!("../fixtures/Calculator.java");
const API_PY: &str = include_str!("../fixtures/api.py");

#[test]
fn test_python_module_units() {
    let module = analyze_source(CALCULATOR_PY, "python", "calculator.py").unwrap();

    let ids: Vec<&str> = module.units.iter().map(|u| u.id.as_str()).collect();
    assert!(ids.contains(&"calculator.Calculator"));
    assert!(ids.contains(&"calculator.Calculator.divide"));
    assert!(ids.contains(&"calculator.scale"));
    assert!(ids.contains(&"calculator._internal_debug"));
}

#[test]
fn test_python_guard_detection() {
    let module = analyze_source(CALCULATOR_PY, "python", "calculator.py").unwrap();
    let divide = module
        .units
        .iter()
        .find(|u| u.id == "calculator.Calculator.divide")
        .unwrap();

    assert_eq!(divide.guards.len(), 1);
    assert_eq!(divide.guards[0].param, "b");
    assert_eq!(divide.guards[0].trigger, "0");
    assert_eq!(divide.guards[0].error_kind, "ZeroDivisionError");
    assert_eq!(divide.return_type.as_deref(), Some("float"));
}

#[test]
fn test_python_static_and_private_flags() {
    let module = analyze_source(CALCULATOR_PY, "python", "calculator.py").unwrap();

    let clamp = module
        .units
        .iter()
        .find(|u| u.name == "clamp")
        .unwrap();
    assert!(clamp.is_static);
    assert_eq!(clamp.kind, UnitKind::Method);

    let private = module
        .units
        .iter()
        .find(|u| u.name == "_internal_debug")
        .unwrap();
    assert!(private.is_private);
}

#[test]
fn test_python_class_unit_carries_constructor_params() {
    let module = analyze_source(CALCULATOR_PY, "python", "calculator.py").unwrap();
    let class = module
        .units
        .iter()
        .find(|u| u.kind == UnitKind::Class)
        .unwrap();
    assert_eq!(class.name, "Calculator");
    assert_eq!(class.params.len(), 1);
    assert_eq!(class.params[0].name, "precision");
}

#[test]
fn test_python_imports_recorded() {
    let module = analyze_source(API_PY, "python", "api.py").unwrap();
    assert!(module.imports_module("flask"));
    assert!(module.imports_module("sqlite3"));
    assert!(!module.imports_module("django"));
}

#[test]
fn test_java_class_extraction() {
    let module = analyze_source(CALCULATOR_JAVA, "java", "Calculator.java").unwrap();

    let class = module
        .units
        .iter()
        .find(|u| u.kind == UnitKind::Class)
        .unwrap();
    assert_eq!(class.name, "Calculator");
    assert_eq!(class.params.len(), 1);

    let divide = module.units.iter().find(|u| u.name == "divide").unwrap();
    assert_eq!(divide.guards.len(), 1);
    assert_eq!(divide.guards[0].error_kind, "ArithmeticException");

    let add = module.units.iter().find(|u| u.name == "add").unwrap();
    assert!(add.is_static);

    let round = module.units.iter().find(|u| u.name == "round").unwrap();
    assert!(round.is_private);
}

#[test]
fn test_units_sorted_by_line() {
    let module = analyze_source(CALCULATOR_PY, "python", "calculator.py").unwrap();
    let lines: Vec<usize> = module.units.iter().map(|u| u.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
}

#[test]
fn test_registry_detects_languages() {
    let registry = LanguageRegistry::global();
    assert!(registry.get_by_extension("py").is_some());
    assert!(registry.get_by_extension("java").is_some());
    assert!(registry.get_by_name("python3").is_some());
    assert!(registry.get_by_extension("rb").is_none());
}

#[test]
fn test_broken_unit_does_not_poison_module() {
    let source = r#"
def good(a: int) -> int:
    return a + 1


def broken(:
    ???
"#;
    let module = analyze_source(source, "python", "mixed.py").unwrap();
    assert!(module.units.iter().any(|u| u.name == "good"));
    assert!(!module.issues.is_empty());
}

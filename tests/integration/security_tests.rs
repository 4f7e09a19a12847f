//! Security classification and probe generation.

use std::collections::BTreeSet;

use testsmith::analyze_source;
use testsmith::config::CoverageType;
use testsmith::synth::cases::CaseKind;
use testsmith::synth::{security, synthesize, Expected, ValueTables};
use testsmith::{EffectTable, EffectTag, GeneratorConfig, Severity, VulnClass};

const INSECURE_PY: &str = include_str!("../fixtures/insecure.py");
const REPOSITORY_JAVA: &str = include_str!("../fixtures/UserRepository.java");

fn classify(source: &str, language: &str, file: &str) -> Vec<(String, testsmith::effects::Classification)> {
    let module = analyze_source(source, language, file).unwrap();
    let table = EffectTable::with_extensions(&BTreeSet::new()).unwrap();
    module
        .units
        .iter()
        .map(|u| (u.id.clone(), table.classify(u)))
        .collect()
}

#[test]
fn test_command_injection_flagged_critical() {
    let classified = classify(INSECURE_PY, "python", "insecure.py");
    let (_, run_command) = classified
        .iter()
        .find(|(id, _)| id == "insecure.run_command")
        .unwrap();

    let vuln = run_command
        .vulns
        .iter()
        .find(|v| v.class == VulnClass::CommandInjection)
        .unwrap();
    assert_eq!(vuln.severity, Severity::Critical);
    assert_eq!(vuln.symbol, "os.system");
    assert!(run_command
        .effects
        .iter()
        .any(|e| e.tag == EffectTag::ProcessExec));
}

#[test]
fn test_sql_and_deserialization_flagged() {
    let classified = classify(INSECURE_PY, "python", "insecure.py");

    let (_, lookup) = classified
        .iter()
        .find(|(id, _)| id == "insecure.lookup")
        .unwrap();
    assert!(lookup.vulns.iter().any(|v| v.class == VulnClass::SqlInjection));

    let (_, load_session) = classified
        .iter()
        .find(|(id, _)| id == "insecure.load_session")
        .unwrap();
    assert!(load_session
        .vulns
        .iter()
        .any(|v| v.class == VulnClass::UnsafeDeserialization));
}

#[test]
fn test_path_traversal_for_string_steered_file_read() {
    let classified = classify(INSECURE_PY, "python", "insecure.py");
    let (_, read_report) = classified
        .iter()
        .find(|(id, _)| id == "insecure.read_report")
        .unwrap();
    assert!(read_report
        .vulns
        .iter()
        .any(|v| v.class == VulnClass::PathTraversal));
}

#[test]
fn test_java_sql_symbols_flagged() {
    let classified = classify(REPOSITORY_JAVA, "java", "UserRepository.java");
    let (_, find) = classified
        .iter()
        .find(|(id, _)| id.ends_with("findByName"))
        .unwrap();
    assert!(find.effects.iter().any(|e| e.tag == EffectTag::Database));
    assert!(find.vulns.iter().any(|v| v.class == VulnClass::SqlInjection));
}

#[test]
fn test_probe_count_matches_payload_list() {
    let module = analyze_source(INSECURE_PY, "python", "insecure.py").unwrap();
    let table = EffectTable::with_extensions(&BTreeSet::new()).unwrap();
    let config = GeneratorConfig {
        coverage: CoverageType::Full,
        ..GeneratorConfig::default()
    };
    let tables = ValueTables::from_config(&config);

    let run_command = module
        .units
        .iter()
        .find(|u| u.id == "insecure.run_command")
        .unwrap();
    let classification = table.classify(run_command);
    let cases = synthesize(run_command, &classification, None, &config, &tables);

    let probes = cases
        .iter()
        .filter(|c| c.vuln == Some(VulnClass::CommandInjection))
        .count();
    assert_eq!(probes, security::payloads(VulnClass::CommandInjection).len());
    assert!(cases
        .iter()
        .filter(|c| c.kind == CaseKind::Security)
        .all(|c| c.expected == Expected::Rejection));
}

#[test]
fn test_probes_absent_below_full_coverage() {
    let module = analyze_source(INSECURE_PY, "python", "insecure.py").unwrap();
    let table = EffectTable::with_extensions(&BTreeSet::new()).unwrap();
    let config = GeneratorConfig::default();
    let tables = ValueTables::from_config(&config);

    for unit in &module.units {
        let classification = table.classify(unit);
        let cases = synthesize(unit, &classification, None, &config, &tables);
        assert!(cases.iter().all(|c| c.kind != CaseKind::Security));
    }
}

#[test]
fn test_payload_lists_are_stable() {
    assert_eq!(security::payloads(VulnClass::SqlInjection)[0], "'; DROP TABLE users; --");
    assert_eq!(security::payloads(VulnClass::PathTraversal)[0], "../../../etc/passwd");
    assert_eq!(security::payloads(VulnClass::CommandInjection).len(), 5);
}

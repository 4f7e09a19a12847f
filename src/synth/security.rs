//! Fixed attack payload tables for security probes.
//!
//! Each vulnerability class carries a closed, ordered payload list; one probe
//! case is synthesized per payload. The lists are deliberately static so that
//! repeated runs emit byte-identical suites.

use crate::effects::VulnClass;

const SQL_INJECTION: &[&str] = &[
    "'; DROP TABLE users; --",
    "' OR '1'='1",
    "' UNION SELECT * FROM users --",
    "'; INSERT INTO users VALUES ('hacker', 'password'); --",
];

const XSS: &[&str] = &[
    "<script>alert('xss')</script>",
    "<img src=x onerror=alert('xss')>",
    "javascript:alert('xss')",
    "<svg onload=alert('xss')>",
];

const PATH_TRAVERSAL: &[&str] = &[
    "../../../etc/passwd",
    "..\\..\\..\\windows\\system32\\drivers\\etc\\hosts",
    "/etc/passwd",
    "C:\\Windows\\System32\\drivers\\etc\\hosts",
];

const COMMAND_INJECTION: &[&str] = &[
    "; ls -la",
    "| cat /etc/passwd",
    "& whoami",
    "`id`",
    "$(whoami)",
];

const CODE_INJECTION: &[&str] = &[
    "__import__('os').system('id')",
    "exec('import os; os.system(\\'id\\')')",
    "eval('__import__(\\'os\\').system(\\'id\\')')",
    "compile('import os; os.system(\\'id\\')', '<string>', 'exec')",
];

const UNSAFE_DESERIALIZATION: &[&str] = &[
    "cos\nsystem\n(S'id'\ntR.",
    "!!python/object/apply:os.system ['id']",
    "{\"py/object\": \"os.system\"}",
];

// Known magic-hash values: numeric-looking strings whose MD5 digests start
// with 0e, defeating loose digest comparison.
const WEAK_CRYPTO: &[&str] = &["240610708", "QNKCDZO"];

const HARDCODED_SECRET: &[&str] = &["hunter2", "changeme"];

const MISSING_VALIDATION: &[&str] = &["", "%00", "\u{202e}admin"];

/// Ordered payload list for one vulnerability class.
#[must_use]
pub fn payloads(class: VulnClass) -> &'static [&'static str] {
    match class {
        VulnClass::SqlInjection => SQL_INJECTION,
        VulnClass::Xss => XSS,
        VulnClass::PathTraversal => PATH_TRAVERSAL,
        VulnClass::CommandInjection => COMMAND_INJECTION,
        VulnClass::CodeInjection => CODE_INJECTION,
        VulnClass::UnsafeDeserialization => UNSAFE_DESERIALIZATION,
        VulnClass::WeakCrypto => WEAK_CRYPTO,
        VulnClass::HardcodedSecret => HARDCODED_SECRET,
        VulnClass::MissingValidation => MISSING_VALIDATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_counts_are_fixed() {
        assert_eq!(payloads(VulnClass::SqlInjection).len(), 4);
        assert_eq!(payloads(VulnClass::Xss).len(), 4);
        assert_eq!(payloads(VulnClass::PathTraversal).len(), 4);
        assert_eq!(payloads(VulnClass::CommandInjection).len(), 5);
        assert_eq!(payloads(VulnClass::CodeInjection).len(), 4);
    }

    #[test]
    fn test_every_class_has_payloads() {
        for class in [
            VulnClass::CodeInjection,
            VulnClass::SqlInjection,
            VulnClass::CommandInjection,
            VulnClass::PathTraversal,
            VulnClass::Xss,
            VulnClass::UnsafeDeserialization,
            VulnClass::WeakCrypto,
            VulnClass::HardcodedSecret,
            VulnClass::MissingValidation,
        ] {
            assert!(!payloads(class).is_empty(), "{class} has no payloads");
        }
    }
}

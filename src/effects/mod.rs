//! Dependency classification: effect tags and vulnerability findings.
//!
//! Inspects a unit's recorded call targets (and, for source-pattern classes
//! like hardcoded secrets, its body text) against a static table of
//! known-effectful symbols. Matching is conservative: unknown symbols get no
//! tag, so a unit with no recognized effectful usage is never mocked.
//!
//! The built-in table is immutable process-wide state built once at first
//! use; the caller-supplied `mock_dependencies` extension from the
//! configuration is layered on per run, never mutated afterwards.

use std::collections::BTreeSet;

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzer::types::SourceUnit;
use crate::error::{Result, TestsmithError};

/// Externally-observable side effect a unit body may trigger.
///
/// Absence of any finding is the "none" classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTag {
    Network,
    Filesystem,
    Database,
    Randomness,
    Time,
    ProcessExec,
}

impl std::fmt::Display for EffectTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Filesystem => write!(f, "filesystem"),
            Self::Database => write!(f, "database"),
            Self::Randomness => write!(f, "randomness"),
            Self::Time => write!(f, "time"),
            Self::ProcessExec => write!(f, "process_exec"),
        }
    }
}

/// Vulnerability taxonomy for security probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnClass {
    CodeInjection,
    SqlInjection,
    CommandInjection,
    PathTraversal,
    Xss,
    UnsafeDeserialization,
    WeakCrypto,
    HardcodedSecret,
    MissingValidation,
}

impl VulnClass {
    /// Stable snake_case name used in case identifiers and reports.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::CodeInjection => "code_injection",
            Self::SqlInjection => "sql_injection",
            Self::CommandInjection => "command_injection",
            Self::PathTraversal => "path_traversal",
            Self::Xss => "xss",
            Self::UnsafeDeserialization => "unsafe_deserialization",
            Self::WeakCrypto => "weak_crypto",
            Self::HardcodedSecret => "hardcoded_secret",
            Self::MissingValidation => "missing_validation",
        }
    }

    /// Default severity for findings of this class.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::CodeInjection | Self::CommandInjection => Severity::Critical,
            Self::SqlInjection
            | Self::PathTraversal
            | Self::UnsafeDeserialization
            | Self::HardcodedSecret => Severity::High,
            Self::Xss | Self::WeakCrypto | Self::MissingValidation => Severity::Medium,
        }
    }
}

impl std::fmt::Display for VulnClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Severity of a flagged vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One effect finding: a tag plus the specific symbol that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectFinding {
    pub tag: EffectTag,
    /// The invoked symbol, verbatim from the call site.
    pub symbol: String,
    /// 1-indexed line of the first matching call.
    pub line: usize,
}

/// One vulnerability finding used to drive security probes and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnFinding {
    pub class: VulnClass,
    pub severity: Severity,
    /// The symbol or source evidence that triggered the finding.
    pub symbol: String,
    /// 1-indexed line.
    pub line: usize,
}

/// Classification result for one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub effects: Vec<EffectFinding>,
    pub vulns: Vec<VulnFinding>,
}

impl Classification {
    /// Whether the unit carries any effect tag.
    #[must_use]
    pub fn is_effectful(&self) -> bool {
        !self.effects.is_empty()
    }
}

// =============================================================================
// Built-in symbol tables
// =============================================================================

/// Known-effectful symbols. Matching is boundary-checked substring search, so
/// `open` matches `open` and `io.open` but never `urlopen` or `os.popen`.
const EFFECT_SYMBOLS: &[(&str, EffectTag)] = &[
    // Network
    ("requests.get", EffectTag::Network),
    ("requests.post", EffectTag::Network),
    ("requests.put", EffectTag::Network),
    ("requests.delete", EffectTag::Network),
    ("requests.request", EffectTag::Network),
    ("urlopen", EffectTag::Network),
    ("urllib.request", EffectTag::Network),
    ("httpx.get", EffectTag::Network),
    ("httpx.post", EffectTag::Network),
    ("socket.socket", EffectTag::Network),
    ("http.client.HTTPConnection", EffectTag::Network),
    ("HttpClient.newHttpClient", EffectTag::Network),
    ("client.send", EffectTag::Network),
    ("new URL", EffectTag::Network),
    ("new Socket", EffectTag::Network),
    (".openConnection", EffectTag::Network),
    // Filesystem
    ("open", EffectTag::Filesystem),
    ("os.remove", EffectTag::Filesystem),
    ("os.rename", EffectTag::Filesystem),
    ("os.makedirs", EffectTag::Filesystem),
    ("os.unlink", EffectTag::Filesystem),
    ("Path.read_text", EffectTag::Filesystem),
    ("Path.write_text", EffectTag::Filesystem),
    ("shutil.copy", EffectTag::Filesystem),
    ("shutil.rmtree", EffectTag::Filesystem),
    ("shutil.move", EffectTag::Filesystem),
    ("Files.readAllBytes", EffectTag::Filesystem),
    ("Files.readAllLines", EffectTag::Filesystem),
    ("Files.write", EffectTag::Filesystem),
    ("Files.readString", EffectTag::Filesystem),
    ("Files.writeString", EffectTag::Filesystem),
    ("new FileInputStream", EffectTag::Filesystem),
    ("new FileOutputStream", EffectTag::Filesystem),
    ("new FileReader", EffectTag::Filesystem),
    ("new FileWriter", EffectTag::Filesystem),
    // Database
    ("cursor.execute", EffectTag::Database),
    ("cursor.executemany", EffectTag::Database),
    ("cursor.executescript", EffectTag::Database),
    ("sqlite3.connect", EffectTag::Database),
    ("psycopg2.connect", EffectTag::Database),
    ("pymongo.MongoClient", EffectTag::Database),
    ("session.query", EffectTag::Database),
    ("session.execute", EffectTag::Database),
    ("session.commit", EffectTag::Database),
    ("engine.execute", EffectTag::Database),
    ("DriverManager.getConnection", EffectTag::Database),
    ("statement.executeQuery", EffectTag::Database),
    ("statement.executeUpdate", EffectTag::Database),
    ("connection.createStatement", EffectTag::Database),
    // Randomness
    ("random.random", EffectTag::Randomness),
    ("random.randint", EffectTag::Randomness),
    ("random.choice", EffectTag::Randomness),
    ("random.uniform", EffectTag::Randomness),
    ("random.sample", EffectTag::Randomness),
    ("random.shuffle", EffectTag::Randomness),
    ("secrets.token_hex", EffectTag::Randomness),
    ("uuid.uuid4", EffectTag::Randomness),
    ("Math.random", EffectTag::Randomness),
    ("new Random", EffectTag::Randomness),
    ("ThreadLocalRandom.current", EffectTag::Randomness),
    // Time
    ("time.time", EffectTag::Time),
    ("time.sleep", EffectTag::Time),
    ("datetime.now", EffectTag::Time),
    ("datetime.today", EffectTag::Time),
    ("datetime.utcnow", EffectTag::Time),
    ("date.today", EffectTag::Time),
    ("System.currentTimeMillis", EffectTag::Time),
    ("System.nanoTime", EffectTag::Time),
    ("Instant.now", EffectTag::Time),
    ("LocalDateTime.now", EffectTag::Time),
    ("LocalDate.now", EffectTag::Time),
    // Process execution
    ("os.system", EffectTag::ProcessExec),
    ("os.popen", EffectTag::ProcessExec),
    ("subprocess.run", EffectTag::ProcessExec),
    ("subprocess.call", EffectTag::ProcessExec),
    ("subprocess.Popen", EffectTag::ProcessExec),
    ("subprocess.check_output", EffectTag::ProcessExec),
    ("Runtime.getRuntime", EffectTag::ProcessExec),
    ("new ProcessBuilder", EffectTag::ProcessExec),
];

/// Dangerous-operation symbols driving security probes.
const VULN_SYMBOLS: &[(&str, VulnClass)] = &[
    // Code execution primitives
    ("eval", VulnClass::CodeInjection),
    ("exec", VulnClass::CodeInjection),
    ("compile", VulnClass::CodeInjection),
    ("__import__", VulnClass::CodeInjection),
    ("ScriptEngine.eval", VulnClass::CodeInjection),
    // SQL construction
    ("cursor.execute", VulnClass::SqlInjection),
    ("cursor.executemany", VulnClass::SqlInjection),
    ("session.execute", VulnClass::SqlInjection),
    ("engine.execute", VulnClass::SqlInjection),
    ("statement.executeQuery", VulnClass::SqlInjection),
    ("statement.executeUpdate", VulnClass::SqlInjection),
    // Command execution
    ("os.system", VulnClass::CommandInjection),
    ("os.popen", VulnClass::CommandInjection),
    ("subprocess.run", VulnClass::CommandInjection),
    ("subprocess.call", VulnClass::CommandInjection),
    ("subprocess.Popen", VulnClass::CommandInjection),
    ("Runtime.getRuntime", VulnClass::CommandInjection),
    ("new ProcessBuilder", VulnClass::CommandInjection),
    // Rendering sinks
    ("render_template_string", VulnClass::Xss),
    ("Markup", VulnClass::Xss),
    ("document.write", VulnClass::Xss),
    ("response.getWriter", VulnClass::Xss),
    // Deserialization
    ("pickle.loads", VulnClass::UnsafeDeserialization),
    ("pickle.load", VulnClass::UnsafeDeserialization),
    ("yaml.load", VulnClass::UnsafeDeserialization),
    ("marshal.loads", VulnClass::UnsafeDeserialization),
    ("jsonpickle.decode", VulnClass::UnsafeDeserialization),
    ("new ObjectInputStream", VulnClass::UnsafeDeserialization),
    (".readObject", VulnClass::UnsafeDeserialization),
    // Weak crypto
    ("hashlib.md5", VulnClass::WeakCrypto),
    ("hashlib.sha1", VulnClass::WeakCrypto),
    ("DES.new", VulnClass::WeakCrypto),
    ("ARC4.new", VulnClass::WeakCrypto),
    // Unvalidated input
    ("input", VulnClass::MissingValidation),
    ("raw_input", VulnClass::MissingValidation),
];

/// Hardcoded-credential assignment pattern, applied to body text.
static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(password|passwd|secret|api_key|apikey|token|private_key)\s*=\s*["'][^"']{3,}["']"#)
        .expect("secret pattern is valid")
});

/// Weak digest selection in Java, applied to body text.
static WEAK_DIGEST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"MessageDigest\.getInstance\(\s*"(MD5|SHA-?1)""#)
        .expect("weak digest pattern is valid")
});

// =============================================================================
// Effect table
// =============================================================================

/// Immutable per-run classification table: the built-in symbols plus the
/// caller's `mock_dependencies` extension.
pub struct EffectTable {
    effect_patterns: Vec<(String, EffectTag)>,
    effect_matcher: AhoCorasick,
    vuln_matcher: AhoCorasick,
}

impl EffectTable {
    /// Build the table for one run.
    ///
    /// # Errors
    ///
    /// Returns [`TestsmithError::Config`] when an extension symbol is empty.
    pub fn with_extensions(extensions: &BTreeSet<String>) -> Result<Self> {
        let mut effect_patterns: Vec<(String, EffectTag)> = EFFECT_SYMBOLS
            .iter()
            .map(|(s, t)| ((*s).to_string(), *t))
            .collect();
        for symbol in extensions {
            if symbol.trim().is_empty() {
                return Err(TestsmithError::Config(
                    "mock_dependencies entries must be non-empty".to_string(),
                ));
            }
            effect_patterns.push((symbol.clone(), infer_extension_tag(symbol)));
        }

        let effect_matcher = AhoCorasick::new(effect_patterns.iter().map(|(s, _)| s))
            .map_err(|e| TestsmithError::Config(format!("invalid symbol table: {e}")))?;
        let vuln_matcher = AhoCorasick::new(VULN_SYMBOLS.iter().map(|(s, _)| s))
            .map_err(|e| TestsmithError::Config(format!("invalid symbol table: {e}")))?;

        Ok(Self {
            effect_patterns,
            effect_matcher,
            vuln_matcher,
        })
    }

    /// Classify one unit. Pure lookup; unknown symbols yield nothing.
    #[must_use]
    pub fn classify(&self, unit: &SourceUnit) -> Classification {
        let mut effects: Vec<EffectFinding> = Vec::new();
        let mut vulns: Vec<VulnFinding> = Vec::new();
        let mut seen_effects: BTreeSet<(EffectTag, String)> = BTreeSet::new();
        let mut seen_vulns: BTreeSet<(VulnClass, String)> = BTreeSet::new();

        for call in &unit.calls {
            for m in self.effect_matcher.find_overlapping_iter(&call.target) {
                if !word_bounded(&call.target, m.start(), m.end()) {
                    continue;
                }
                let tag = self.effect_patterns[m.pattern().as_usize()].1;
                if seen_effects.insert((tag, call.target.clone())) {
                    effects.push(EffectFinding {
                        tag,
                        symbol: call.target.clone(),
                        line: call.line,
                    });
                }
            }
            for m in self.vuln_matcher.find_overlapping_iter(&call.target) {
                if !word_bounded(&call.target, m.start(), m.end()) {
                    continue;
                }
                let class = VULN_SYMBOLS[m.pattern().as_usize()].1;
                if seen_vulns.insert((class, call.target.clone())) {
                    vulns.push(VulnFinding {
                        class,
                        severity: class.severity(),
                        symbol: call.target.clone(),
                        line: call.line,
                    });
                }
            }
        }

        // Source-pattern classes: evidence lives in the body text, not at a
        // call site.
        if let Some(m) = SECRET_PATTERN.find(&unit.body) {
            let evidence = unit.body[m.range()]
                .split('=')
                .next()
                .unwrap_or("credential")
                .trim()
                .to_string();
            vulns.push(VulnFinding {
                class: VulnClass::HardcodedSecret,
                severity: VulnClass::HardcodedSecret.severity(),
                symbol: evidence,
                line: unit.line + line_of_offset(&unit.body, m.start()),
            });
        }
        if WEAK_DIGEST_PATTERN.is_match(&unit.body)
            && !vulns.iter().any(|v| v.class == VulnClass::WeakCrypto)
        {
            vulns.push(VulnFinding {
                class: VulnClass::WeakCrypto,
                severity: VulnClass::WeakCrypto.severity(),
                symbol: "MessageDigest.getInstance".to_string(),
                line: unit.line,
            });
        }

        // Filesystem access steered by a string parameter is a traversal
        // candidate.
        if unit.has_string_param() {
            if let Some(fs) = effects.iter().find(|e| e.tag == EffectTag::Filesystem) {
                if seen_vulns.insert((VulnClass::PathTraversal, fs.symbol.clone())) {
                    vulns.push(VulnFinding {
                        class: VulnClass::PathTraversal,
                        severity: VulnClass::PathTraversal.severity(),
                        symbol: fs.symbol.clone(),
                        line: fs.line,
                    });
                }
            }
        }

        vulns.sort_by_key(|v| (v.line, v.class));
        Classification { effects, vulns }
    }
}

/// Infer the effect tag for a caller-supplied extension symbol from its name.
/// Unknown shapes default to Network: an opaque external dependency behaves
/// most like a remote service from the test's point of view.
fn infer_extension_tag(symbol: &str) -> EffectTag {
    let lower = symbol.to_lowercase();
    if ["sql", "db", "mongo", "redis", "postgres", "sqlite", "cursor"]
        .iter()
        .any(|k| lower.contains(k))
    {
        EffectTag::Database
    } else if ["file", "path", "disk", "storage", "io."].iter().any(|k| lower.contains(k)) {
        EffectTag::Filesystem
    } else if ["time", "clock", "date"].iter().any(|k| lower.contains(k)) {
        EffectTag::Time
    } else if lower.contains("rand") {
        EffectTag::Randomness
    } else if ["proc", "exec", "cmd", "shell"].iter().any(|k| lower.contains(k)) {
        EffectTag::ProcessExec
    } else {
        EffectTag::Network
    }
}

/// Check that a substring match sits on identifier boundaries.
fn word_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let bytes = haystack.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let left_ok = start == 0 || !is_ident(bytes[start - 1]);
    let right_ok = end == bytes.len() || !is_ident(bytes[end]);
    left_ok && right_ok
}

/// 0-indexed line offset of a byte position inside a text block.
fn line_of_offset(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|b| *b == b'\n').count()
}

//! Generator configuration.
//!
//! Mirrors the option surface consumed from collaborators: mock
//! aggressiveness, coverage selection, fixture/parametrize toggles, output
//! splitting, and the user-supplied extension to the known-effectful symbol
//! table. The config round-trips through serde so callers can load it from
//! JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TestsmithError};
use crate::synth::values::Literal;

/// How aggressively effect tags produce mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockLevel {
    /// Never generate mocks, even for effectful units.
    None,
    /// Mock externally-visible effects only (network, database, filesystem,
    /// process execution).
    Basic,
    /// Mock every tagged symbol, including time and randomness.
    Comprehensive,
}

impl Default for MockLevel {
    fn default() -> Self {
        Self::Comprehensive
    }
}

/// Which case kinds the synthesizer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    /// Happy-path cases only.
    HappyPath,
    /// Happy-path plus boundary, error, and framework cases.
    Comprehensive,
    /// Everything, including security probes.
    Full,
}

impl Default for CoverageType {
    fn default() -> Self {
        Self::Comprehensive
    }
}

/// Configuration for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Mock generation level.
    pub mock_level: MockLevel,
    /// Case-kind coverage.
    pub coverage: CoverageType,
    /// Generate cases for private units (leading underscore in Python,
    /// `private` modifier in Java).
    pub include_private: bool,
    /// Convert reusable mocks into fixtures instead of per-case patches.
    pub generate_fixtures: bool,
    /// Group boundary cases over one parameter into a single parametrized
    /// test at render time.
    pub generate_parametrized: bool,
    /// Maximum rendered lines per emitted file. Must be positive.
    pub max_lines_per_file: usize,
    /// Split overflowing suites into additional files. When false, a suite
    /// always renders as a single file regardless of the line limit.
    pub split_large_files: bool,
    /// Caller-supplied symbol names appended to the built-in known-effectful
    /// table. Tags are inferred from the symbol name.
    pub mock_dependencies: BTreeSet<String>,
    /// Upper bound on boundary cases emitted per parameter.
    pub boundary_cases_per_param: usize,
    /// Per-type overrides for the happy-path default literal
    /// (keyed by base type name: "int", "float", "str", "bool", "list", "map").
    pub happy_value_overrides: BTreeMap<String, Literal>,
    /// Per-type overrides for the boundary literal sets.
    pub boundary_value_overrides: BTreeMap<String, Vec<Literal>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            mock_level: MockLevel::default(),
            coverage: CoverageType::default(),
            include_private: false,
            generate_fixtures: true,
            generate_parametrized: true,
            max_lines_per_file: 200,
            split_large_files: true,
            mock_dependencies: BTreeSet::new(),
            boundary_cases_per_param: 3,
            happy_value_overrides: BTreeMap::new(),
            boundary_value_overrides: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns [`TestsmithError::Config`] for values that would make
    /// generation meaningless (zero line limit, zero boundary budget with
    /// boundary coverage requested).
    pub fn validate(&self) -> Result<()> {
        if self.max_lines_per_file == 0 {
            return Err(TestsmithError::Config(
                "max_lines_per_file must be positive".to_string(),
            ));
        }
        if self.boundary_cases_per_param == 0 && self.coverage != CoverageType::HappyPath {
            return Err(TestsmithError::Config(
                "boundary_cases_per_param must be positive for comprehensive coverage".to_string(),
            ));
        }
        for key in self
            .happy_value_overrides
            .keys()
            .chain(self.boundary_value_overrides.keys())
        {
            if !matches!(key.as_str(), "int" | "float" | "str" | "bool" | "list" | "map") {
                return Err(TestsmithError::Config(format!(
                    "unknown base type in value override: {key}"
                )));
            }
        }
        Ok(())
    }

    /// Load a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| TestsmithError::Config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TestsmithError::Config(format!("config serialization failed: {e}")))
    }

    /// Whether security probes are in scope for this run.
    #[must_use]
    pub fn security_enabled(&self) -> bool {
        self.coverage == CoverageType::Full
    }

    /// Whether boundary and error cases are in scope for this run.
    #[must_use]
    pub fn beyond_happy_path(&self) -> bool {
        self.coverage >= CoverageType::Comprehensive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_line_limit_rejected() {
        let config = GeneratorConfig {
            max_lines_per_file: 0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_override_key_rejected() {
        let mut config = GeneratorConfig::default();
        config
            .happy_value_overrides
            .insert("tuple".to_string(), Literal::Int(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = GeneratorConfig::default();
        config.mock_dependencies.insert("stripe".to_string());
        config.max_lines_per_file = 120;

        let json = config.to_json().unwrap();
        let restored = GeneratorConfig::from_json(&json).unwrap();

        assert_eq!(restored.max_lines_per_file, 120);
        assert!(restored.mock_dependencies.contains("stripe"));
        assert_eq!(restored.mock_level, MockLevel::Comprehensive);
    }

    #[test]
    fn test_coverage_ordering() {
        assert!(CoverageType::Full > CoverageType::Comprehensive);
        assert!(CoverageType::Comprehensive > CoverageType::HappyPath);
    }
}

//! Literal values and per-type default/boundary tables.
//!
//! The synthesizer never evaluates the target's semantics; it only needs
//! representative and boundary literals per declared parameter type. The
//! tables here ship the stock sets and accept per-type overrides from the
//! configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

/// A concrete, language-neutral literal used as a test input or a scripted
/// mock return value. Rendered per target language at emission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    List(Vec<Literal>),
    Map(Vec<(String, Literal)>),
    Null,
}

impl Literal {
    /// Render as Python source text.
    #[must_use]
    pub fn render_python(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    format!("{v:.1}")
                } else {
                    v.to_string()
                }
            }
            Self::Str(v) => format!("{:?}", v),
            Self::Bool(v) => if *v { "True" } else { "False" }.to_string(),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::render_python).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v.render_python()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Self::Null => "None".to_string(),
        }
    }

    /// Render as Java source text.
    #[must_use]
    pub fn render_java(&self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format!("{v}"),
            Self::Str(v) => format!("{:?}", v),
            Self::Bool(v) => v.to_string(),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::render_java).collect();
                format!("List.of({})", inner.join(", "))
            }
            Self::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{:?}, {}", k, v.render_java()))
                    .collect();
                format!("Map.of({})", inner.join(", "))
            }
            Self::Null => "null".to_string(),
        }
    }

    /// Render for the given language name (falls back to Python style).
    #[must_use]
    pub fn render(&self, language: &str) -> String {
        match language {
            "java" => self.render_java(),
            _ => self.render_python(),
        }
    }
}

/// Base type classification used to pick value tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Int,
    Float,
    Str,
    Bool,
    List,
    Map,
    Unknown,
}

impl BaseType {
    /// Classify a declared type hint from either supported language.
    ///
    /// Unknown and missing hints default to `Str`: the original tool made the
    /// same call, and a short string literal is the least likely input to
    /// crash an untyped unit.
    #[must_use]
    pub fn from_hint(hint: Option<&str>) -> Self {
        let Some(hint) = hint else {
            return Self::Str;
        };
        let lower = hint.trim().to_lowercase();
        if lower.is_empty() {
            return Self::Str;
        }
        // Collection shapes first: `List[int]` and `Dict[str, int]` must not
        // fall into the scalar branches through their type arguments.
        if lower.contains("list") || lower.contains("[]") || lower.contains("array") {
            Self::List
        } else if lower.contains("dict") || lower.contains("map") {
            Self::Map
        } else if lower.contains("bool") {
            Self::Bool
        } else if lower.contains("float") || lower.contains("double") {
            Self::Float
        } else if lower.contains("int") || lower.contains("long") || lower.contains("short") {
            Self::Int
        } else if lower.contains("str") || lower.contains("char") {
            Self::Str
        } else {
            Self::Unknown
        }
    }

    /// Stable key used for config overrides.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Map => "map",
            Self::Unknown => "str",
        }
    }
}

/// Per-type happy-path defaults and boundary sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueTables {
    happy: BTreeMap<String, Literal>,
    boundary: BTreeMap<String, Vec<Literal>>,
}

impl Default for ValueTables {
    fn default() -> Self {
        let mut happy = BTreeMap::new();
        happy.insert("int".to_string(), Literal::Int(42));
        happy.insert("float".to_string(), Literal::Float(3.14));
        happy.insert("str".to_string(), Literal::Str("hello".to_string()));
        happy.insert("bool".to_string(), Literal::Bool(true));
        happy.insert(
            "list".to_string(),
            Literal::List(vec![Literal::Int(1), Literal::Int(2), Literal::Int(3)]),
        );
        happy.insert(
            "map".to_string(),
            Literal::Map(vec![("key".to_string(), Literal::Str("value".to_string()))]),
        );

        let mut boundary = BTreeMap::new();
        boundary.insert(
            "int".to_string(),
            vec![
                Literal::Int(0),
                Literal::Int(-1),
                Literal::Int(i64::from(i32::MAX)),
            ],
        );
        boundary.insert(
            "float".to_string(),
            vec![
                Literal::Float(0.0),
                Literal::Float(-1.0),
                Literal::Float(1e10),
            ],
        );
        boundary.insert(
            "str".to_string(),
            vec![
                Literal::Str(String::new()),
                Literal::Str(" ".to_string()),
                Literal::Str("x".repeat(1024)),
            ],
        );
        boundary.insert(
            "list".to_string(),
            vec![Literal::List(Vec::new()), Literal::List(vec![Literal::Int(1)])],
        );
        boundary.insert(
            "map".to_string(),
            vec![Literal::Map(Vec::new())],
        );

        Self { happy, boundary }
    }
}

impl ValueTables {
    /// Build the tables for one run, applying configuration overrides.
    #[must_use]
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let mut tables = Self::default();
        for (key, value) in &config.happy_value_overrides {
            tables.happy.insert(key.clone(), value.clone());
        }
        for (key, values) in &config.boundary_value_overrides {
            tables.boundary.insert(key.clone(), values.clone());
        }
        tables
    }

    /// Representative happy-path literal for a base type.
    #[must_use]
    pub fn happy_value(&self, base: BaseType) -> Literal {
        self.happy
            .get(base.key())
            .cloned()
            .unwrap_or_else(|| Literal::Str("value".to_string()))
    }

    /// Boundary literals for a base type, capped at `limit`. Bool has no
    /// meaningful boundary set and returns empty.
    #[must_use]
    pub fn boundary_values(&self, base: BaseType, limit: usize) -> Vec<Literal> {
        if matches!(base, BaseType::Bool) {
            return Vec::new();
        }
        self.boundary
            .get(base.key())
            .map(|values| values.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_from_hints() {
        assert_eq!(BaseType::from_hint(Some("int")), BaseType::Int);
        assert_eq!(BaseType::from_hint(Some("Integer")), BaseType::Int);
        assert_eq!(BaseType::from_hint(Some("double")), BaseType::Float);
        assert_eq!(BaseType::from_hint(Some("String")), BaseType::Str);
        assert_eq!(BaseType::from_hint(Some("List[int]")), BaseType::List);
        assert_eq!(BaseType::from_hint(Some("int[]")), BaseType::List);
        assert_eq!(BaseType::from_hint(Some("Dict[str, int]")), BaseType::Map);
        assert_eq!(BaseType::from_hint(Some("Map<String, Integer>")), BaseType::Map);
        assert_eq!(BaseType::from_hint(Some("boolean")), BaseType::Bool);
        assert_eq!(BaseType::from_hint(None), BaseType::Str);
    }

    #[test]
    fn test_python_rendering() {
        assert_eq!(Literal::Int(0).render_python(), "0");
        assert_eq!(Literal::Bool(true).render_python(), "True");
        assert_eq!(Literal::Null.render_python(), "None");
        assert_eq!(
            Literal::List(vec![Literal::Int(1), Literal::Int(2)]).render_python(),
            "[1, 2]"
        );
        assert_eq!(
            Literal::Map(vec![("a".to_string(), Literal::Int(1))]).render_python(),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn test_java_rendering() {
        assert_eq!(Literal::Bool(false).render_java(), "false");
        assert_eq!(Literal::Null.render_java(), "null");
        assert_eq!(
            Literal::List(vec![Literal::Int(1)]).render_java(),
            "List.of(1)"
        );
    }

    #[test]
    fn test_boundary_limit_respected() {
        let tables = ValueTables::default();
        let values = tables.boundary_values(BaseType::Int, 2);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], Literal::Int(0));
        assert_eq!(values[1], Literal::Int(-1));
    }

    #[test]
    fn test_config_override_replaces_stock_set() {
        let mut config = GeneratorConfig::default();
        config
            .boundary_value_overrides
            .insert("int".to_string(), vec![Literal::Int(7)]);
        let tables = ValueTables::from_config(&config);
        assert_eq!(
            tables.boundary_values(BaseType::Int, 3),
            vec![Literal::Int(7)]
        );
    }
}

//! Framework detection: route handlers and their HTTP shape.
//!
//! Matches a unit's decorators/annotations and base classes against a static
//! pattern table. Each pattern carries a specificity score so an exact
//! decorator match always beats a base-class heuristic; a tie between
//! different frameworks at the same score means the evidence is contradictory
//! and no binding is produced.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzer::types::{ModuleModel, SourceUnit};

/// Supported web frameworks. Closed set; anything else is unclassified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkKind {
    Flask,
    FastApi,
    Django,
    Spring,
}

impl std::fmt::Display for FrameworkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flask => write!(f, "flask"),
            Self::FastApi => write!(f, "fastapi"),
            Self::Django => write!(f, "django"),
            Self::Spring => write!(f, "spring"),
        }
    }
}

/// HTTP verb of a detected route handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpVerb {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            _ => None,
        }
    }

    /// Status codes a generated test should exercise: the success path plus
    /// the not-found path.
    #[must_use]
    pub fn expected_statuses(self) -> Vec<u16> {
        match self {
            Self::Post => vec![201, 404],
            Self::Delete => vec![204, 404],
            Self::Get | Self::Put | Self::Patch => vec![200, 404],
        }
    }
}

impl std::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

/// Framework annotation attached to a matched unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkBinding {
    pub kind: FrameworkKind,
    pub verb: HttpVerb,
    /// Route path when the pattern exposes one (`/users/<id>`); class-based
    /// views keep their routing in URL tables we do not see.
    pub route: Option<String>,
    pub expected_statuses: Vec<u16>,
}

/// Detection result: a binding, or a warning when the evidence conflicts.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub binding: Option<FrameworkBinding>,
    pub warning: Option<String>,
}

// Decorator-text extractors.
static ROUTE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\(\s*["']([^"']+)["']"#).expect("route path pattern is valid"));
static FLASK_METHODS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"methods\s*=\s*\[\s*["'](\w+)["']"#).expect("methods pattern is valid")
});
static SPRING_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:value|path)\s*=\s*["']([^"']+)["']"#).expect("spring value pattern is valid")
});
static SPRING_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"RequestMethod\.(\w+)").expect("spring method pattern is valid")
});

const DECORATOR_SCORE: u8 = 2;
const BASE_CLASS_SCORE: u8 = 1;

struct Candidate {
    kind: FrameworkKind,
    score: u8,
    binding: FrameworkBinding,
}

/// Classify one unit against the known framework patterns.
///
/// The module model supplies import evidence: a `.route(` decorator only
/// counts as Flask when the module actually imports flask, and likewise for
/// the other frameworks, so locally-defined decorators with familiar names do
/// not misclassify.
#[must_use]
pub fn detect_framework(module: &ModuleModel, unit: &SourceUnit) -> Detection {
    let mut candidates: Vec<Candidate> = Vec::new();

    for decorator in &unit.decorators {
        if let Some(c) = match_flask(module, decorator) {
            candidates.push(c);
        }
        if let Some(c) = match_fastapi(module, decorator) {
            candidates.push(c);
        }
        if let Some(c) = match_spring(decorator) {
            candidates.push(c);
        }
    }
    if let Some(c) = match_django_view(module, unit) {
        candidates.push(c);
    }

    let best = candidates.iter().map(|c| c.score).max();
    let Some(best) = best else {
        return Detection::default();
    };

    let mut at_best: Vec<&Candidate> = candidates.iter().filter(|c| c.score == best).collect();
    let kinds: std::collections::BTreeSet<String> =
        at_best.iter().map(|c| c.kind.to_string()).collect();
    if kinds.len() > 1 {
        let msg = format!(
            "unit '{}' matches multiple frameworks ({}); skipping framework cases",
            unit.id,
            kinds.into_iter().collect::<Vec<_>>().join(", ")
        );
        tracing::warn!(unit = %unit.id, "{msg}");
        return Detection {
            binding: None,
            warning: Some(msg),
        };
    }

    Detection {
        binding: at_best.pop().map(|c| c.binding.clone()),
        warning: None,
    }
}

fn match_flask(module: &ModuleModel, decorator: &str) -> Option<Candidate> {
    if !module.imports_module("flask") {
        return None;
    }
    if !decorator.contains(".route(") {
        return None;
    }
    let verb = FLASK_METHODS
        .captures(decorator)
        .and_then(|c| HttpVerb::from_str(&c[1]))
        .unwrap_or(HttpVerb::Get);
    Some(candidate(FrameworkKind::Flask, DECORATOR_SCORE, verb, route_of(decorator)))
}

fn match_fastapi(module: &ModuleModel, decorator: &str) -> Option<Candidate> {
    if !module.imports_module("fastapi") {
        return None;
    }
    // `@app.get("/x")` and router variants carry the verb in the attribute.
    let method = decorator.split('(').next()?.rsplit('.').next()?;
    let verb = HttpVerb::from_str(method)?;
    Some(candidate(FrameworkKind::FastApi, DECORATOR_SCORE, verb, route_of(decorator)))
}

fn match_spring(decorator: &str) -> Option<Candidate> {
    let name = decorator.split('(').next()?.trim();
    let verb = match name {
        "GetMapping" => Some(HttpVerb::Get),
        "PostMapping" => Some(HttpVerb::Post),
        "PutMapping" => Some(HttpVerb::Put),
        "DeleteMapping" => Some(HttpVerb::Delete),
        "PatchMapping" => Some(HttpVerb::Patch),
        "RequestMapping" => SPRING_METHOD
            .captures(decorator)
            .and_then(|c| HttpVerb::from_str(&c[1]))
            .or(Some(HttpVerb::Get)),
        _ => None,
    }?;
    let route = SPRING_VALUE
        .captures(decorator)
        .map(|c| c[1].to_string())
        .or_else(|| route_of(decorator));
    Some(Candidate {
        kind: FrameworkKind::Spring,
        score: DECORATOR_SCORE,
        binding: FrameworkBinding {
            kind: FrameworkKind::Spring,
            verb,
            route,
            expected_statuses: verb.expected_statuses(),
        },
    })
}

fn match_django_view(module: &ModuleModel, unit: &SourceUnit) -> Option<Candidate> {
    if !module.imports_module("django") {
        return None;
    }
    // Class-based views: `class UserView(View)` or a unit living in one.
    let in_view_class = unit
        .class_name
        .as_deref()
        .is_some_and(|c| c.ends_with("View"));
    let is_view_class = unit.name.ends_with("View");
    if !in_view_class && !is_view_class {
        return None;
    }
    let verb = HttpVerb::from_str(&unit.name).unwrap_or(HttpVerb::Get);
    Some(candidate(FrameworkKind::Django, BASE_CLASS_SCORE, verb, None))
}

fn candidate(kind: FrameworkKind, score: u8, verb: HttpVerb, route: Option<String>) -> Candidate {
    Candidate {
        kind,
        score,
        binding: FrameworkBinding {
            kind,
            verb,
            route,
            expected_statuses: verb.expected_statuses(),
        },
    }
}

fn route_of(decorator: &str) -> Option<String> {
    ROUTE_PATH.captures(decorator).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::{ImportDecl, Param, UnitKind};

    fn module_importing(modules: &[&str]) -> ModuleModel {
        ModuleModel {
            file: "app.py".to_string(),
            language: "python".to_string(),
            imports: modules
                .iter()
                .map(|m| ImportDecl {
                    module: (*m).to_string(),
                    names: Vec::new(),
                    line: 1,
                })
                .collect(),
            units: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn handler(decorators: &[&str]) -> SourceUnit {
        SourceUnit {
            id: "app.handler".to_string(),
            name: "handler".to_string(),
            kind: UnitKind::Function,
            params: vec![Param::new("user_id")],
            return_type: None,
            decorators: decorators.iter().map(|d| (*d).to_string()).collect(),
            calls: Vec::new(),
            guards: Vec::new(),
            body: String::new(),
            is_async: false,
            is_private: false,
            is_static: false,
            class_name: None,
            line: 3,
            end_line: 8,
            byte_range: (0, 0),
            file: "app.py".to_string(),
            language: "python".to_string(),
        }
    }

    #[test]
    fn test_flask_route_with_methods() {
        let module = module_importing(&["flask"]);
        let unit = handler(&["app.route('/users/<id>', methods=['POST'])"]);
        let detection = detect_framework(&module, &unit);
        let binding = detection.binding.unwrap();
        assert_eq!(binding.kind, FrameworkKind::Flask);
        assert_eq!(binding.verb, HttpVerb::Post);
        assert_eq!(binding.route.as_deref(), Some("/users/<id>"));
        assert_eq!(binding.expected_statuses, vec![201, 404]);
    }

    #[test]
    fn test_flask_route_defaults_to_get() {
        let module = module_importing(&["flask"]);
        let unit = handler(&["app.route('/health')"]);
        let binding = detect_framework(&module, &unit).binding.unwrap();
        assert_eq!(binding.verb, HttpVerb::Get);
        assert_eq!(binding.expected_statuses, vec![200, 404]);
    }

    #[test]
    fn test_fastapi_verb_from_decorator_name() {
        let module = module_importing(&["fastapi"]);
        let unit = handler(&["app.delete('/items/{item_id}')"]);
        let binding = detect_framework(&module, &unit).binding.unwrap();
        assert_eq!(binding.kind, FrameworkKind::FastApi);
        assert_eq!(binding.verb, HttpVerb::Delete);
        assert_eq!(binding.expected_statuses, vec![204, 404]);
    }

    #[test]
    fn test_route_decorator_without_import_is_ignored() {
        let module = module_importing(&[]);
        let unit = handler(&["app.route('/users')"]);
        assert!(detect_framework(&module, &unit).binding.is_none());
    }

    #[test]
    fn test_spring_get_mapping() {
        let module = module_importing(&[]);
        let unit = handler(&["GetMapping(\"/api/users\")"]);
        let binding = detect_framework(&module, &unit).binding.unwrap();
        assert_eq!(binding.kind, FrameworkKind::Spring);
        assert_eq!(binding.verb, HttpVerb::Get);
        assert_eq!(binding.route.as_deref(), Some("/api/users"));
    }

    #[test]
    fn test_spring_request_mapping_with_method() {
        let module = module_importing(&[]);
        let unit = handler(&["RequestMapping(value = \"/orders\", method = RequestMethod.PUT)"]);
        let binding = detect_framework(&module, &unit).binding.unwrap();
        assert_eq!(binding.verb, HttpVerb::Put);
        assert_eq!(binding.route.as_deref(), Some("/orders"));
    }

    #[test]
    fn test_django_method_in_view_class() {
        let module = module_importing(&["django.views"]);
        let mut unit = handler(&[]);
        unit.name = "post".to_string();
        unit.kind = UnitKind::Method;
        unit.class_name = Some("UserView".to_string());
        let binding = detect_framework(&module, &unit).binding.unwrap();
        assert_eq!(binding.kind, FrameworkKind::Django);
        assert_eq!(binding.verb, HttpVerb::Post);
        assert!(binding.route.is_none());
    }

    #[test]
    fn test_conflicting_evidence_yields_warning() {
        let module = module_importing(&["flask", "fastapi"]);
        // One decorator parses as Flask, the other as FastAPI, same score.
        let unit = handler(&["app.route('/a')", "app.post('/a')"]);
        let detection = detect_framework(&module, &unit);
        assert!(detection.binding.is_none());
        assert!(detection.warning.is_some());
    }

    #[test]
    fn test_plain_function_has_no_binding() {
        let module = module_importing(&["flask"]);
        let unit = handler(&["lru_cache(maxsize=64)"]);
        let detection = detect_framework(&module, &unit);
        assert!(detection.binding.is_none());
        assert!(detection.warning.is_none());
    }
}

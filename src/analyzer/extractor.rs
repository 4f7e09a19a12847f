//! Source analysis using tree-sitter.
//!
//! Turns raw source text into a [`ModuleModel`] of [`SourceUnit`] values
//! without executing the target. Analysis is a pure transformation: the only
//! inputs are the source text, the declared language, and the owning file
//! path used for identifiers and diagnostics.
//!
//! # Query caching
//!
//! Tree-sitter query compilation costs 1-5ms. Queries are immutable after
//! creation, so they are cached globally keyed by `(language, query_kind)`.
//!
//! # Parser caching
//!
//! Parsers cannot be shared across threads; a thread-local cache reuses one
//! parser per language per thread, checked out for the duration of a parse
//! and returned afterwards.
//!
//! # Error recovery
//!
//! Tree-sitter recovers from localized syntax errors. Units whose span
//! overlaps an error region are dropped and recorded as [`ParseIssue`]s; the
//! remaining units still analyze. A file whose entire content fails to parse
//! yields a `Parse` error.

use std::cell::RefCell;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language as TSLanguage, Node, Parser, Query, QueryCursor, Tree};

use crate::analyzer::types::{
    CallSite, ModuleModel, ParseIssue, SourceUnit, UnitKind,
};
use crate::error::{Result, TestsmithError};
use crate::lang::{Language, LanguageRegistry};

/// Cache key for compiled tree-sitter queries: `(language, query_kind)`.
type QueryCacheKey = (&'static str, &'static str);

/// Thread-safe cache for compiled tree-sitter queries.
static QUERY_CACHE: Lazy<RwLock<FxHashMap<QueryCacheKey, Arc<Query>>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Get or compile a tree-sitter query, using the cache for repeated lookups.
fn get_cached_query(
    ts_lang: &TSLanguage,
    lang_name: &'static str,
    query_kind: &'static str,
    query_str: &str,
) -> Result<Arc<Query>> {
    let key = (lang_name, query_kind);

    {
        let cache = QUERY_CACHE.read();
        if let Some(query) = cache.get(&key) {
            return Ok(Arc::clone(query));
        }
    }

    let query = Query::new(ts_lang, query_str).map_err(|e| {
        TestsmithError::TreeSitter(format!(
            "{lang_name} {query_kind} query failed to compile: {e}"
        ))
    })?;
    let query_arc = Arc::new(query);

    let mut cache = QUERY_CACHE.write();
    // Another thread may have compiled the same query in the meantime.
    cache.entry(key).or_insert_with(|| Arc::clone(&query_arc));
    Ok(query_arc)
}

thread_local! {
    /// Thread-local parser cache, one parser per language name.
    static PARSER_CACHE: RefCell<FxHashMap<&'static str, Parser>> =
        RefCell::new(FxHashMap::default());
}

/// Maximum parsers cached per thread. Covers both supported languages.
const MAX_CACHED_PARSERS: usize = 4;

/// Run `f` with a parser for `lang`, reusing the thread-local cache.
///
/// The parser is checked back in after `f` returns; if `f` panics the parser
/// is simply dropped and the next call creates a fresh one.
fn with_parser<T>(lang: &dyn Language, f: impl FnOnce(&mut Parser) -> T) -> Result<T> {
    let lang_name = lang.name();
    let cached = PARSER_CACHE.with(|cache| cache.borrow_mut().remove(lang_name));
    let mut parser = match cached {
        Some(mut p) => {
            p.reset();
            p
        }
        None => lang.parser()?,
    };

    let out = f(&mut parser);

    PARSER_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() < MAX_CACHED_PARSERS {
            cache.insert(lang_name, parser);
        }
    });
    Ok(out)
}

/// Byte span of a recovered syntax error plus its position.
struct ErrorRegion {
    start: usize,
    end: usize,
    row: usize,
    column: usize,
}

/// Collect error and missing nodes from a recovered parse tree.
fn collect_error_regions(tree: &Tree) -> Vec<ErrorRegion> {
    let mut regions = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            regions.push(ErrorRegion {
                start: node.start_byte(),
                end: node.end_byte(),
                row: node.start_position().row,
                column: node.start_position().column,
            });
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    regions
}

/// Analyze one source text into a structural model.
///
/// # Errors
///
/// - [`TestsmithError::UnsupportedLanguage`] for unknown language tags.
/// - [`TestsmithError::Parse`] when nothing in the file survives error
///   recovery.
/// - [`TestsmithError::TreeSitter`] for parser/query infrastructure
///   failures.
pub fn analyze_source(source: &str, language: &str, file: &str) -> Result<ModuleModel> {
    let lang = LanguageRegistry::global()
        .get_by_name(language)
        .ok_or_else(|| TestsmithError::UnsupportedLanguage(language.to_string()))?;

    let tree = with_parser(lang, |parser| parser.parse(source, None))?
        .ok_or_else(|| TestsmithError::TreeSitter("parser produced no tree".to_string()))?;

    let bytes = source.as_bytes();
    let errors = collect_error_regions(&tree);

    let mut units = build_units(&tree, bytes, lang, file)?;
    assign_calls(&tree, bytes, lang, &mut units)?;

    // Drop units overlapping a syntax error; keep the rest of the file.
    let mut issues = Vec::new();
    let mut attributed = vec![false; errors.len()];
    units.retain(|unit| {
        let overlapping = errors
            .iter()
            .position(|e| e.start < unit.byte_range.1 && e.end > unit.byte_range.0);
        if let Some(index) = overlapping {
            attributed[index] = true;
            let region = &errors[index];
            issues.push(ParseIssue {
                line: region.row + 1,
                column: region.column + 1,
                message: "syntax error".to_string(),
                unit: Some(unit.name.clone()),
            });
            false
        } else {
            true
        }
    });
    // A region not covered by any extracted unit still failed to analyze;
    // report it so the caller sees more than a silently shorter model.
    for (region, seen) in errors.iter().zip(&attributed) {
        if !seen {
            issues.push(ParseIssue {
                line: region.row + 1,
                column: region.column + 1,
                message: "syntax error outside any analyzable declaration".to_string(),
                unit: None,
            });
        }
    }
    if units.is_empty() && !errors.is_empty() {
        let first = &errors[0];
        return Err(TestsmithError::parse_at(
            file,
            first.row,
            first.column,
            "no analyzable declarations survived error recovery",
        ));
    }

    units.sort_by_key(|u| (u.line, u.byte_range.0));

    Ok(ModuleModel {
        file: file.to_string(),
        language: lang.name().to_string(),
        imports: lang.extract_imports(&tree, bytes),
        units,
        issues,
    })
}

/// Run a declaration query and collect the `@function`/`@class` nodes.
fn query_nodes<'tree>(
    tree: &'tree Tree,
    bytes: &[u8],
    lang: &dyn Language,
    kind: &'static str,
    query_str: &str,
    capture: &str,
) -> Result<Vec<Node<'tree>>> {
    let ts_lang = lang.ts_language();
    let query = get_cached_query(&ts_lang, lang.name(), kind, query_str)?;
    let capture_index = query.capture_index_for_name(capture);

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), bytes);

    let mut nodes = Vec::new();
    while let Some(m) = matches.next() {
        let node = match capture_index {
            Some(idx) => m
                .captures
                .iter()
                .find(|c| c.index == idx)
                .map(|c| c.node),
            None => m.captures.first().map(|c| c.node),
        };
        if let Some(node) = node {
            nodes.push(node);
        }
    }
    Ok(nodes)
}

/// Build source units from class and function declarations.
fn build_units(
    tree: &Tree,
    bytes: &[u8],
    lang: &dyn Language,
    file: &str,
) -> Result<Vec<SourceUnit>> {
    let stem = std::path::Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("module")
        .to_string();
    let language = lang.name().to_string();

    let mut units = Vec::new();
    let mut class_ranges: Vec<(usize, usize)> = Vec::new();

    let class_nodes = query_nodes(tree, bytes, lang, "class", lang.class_query(), "class")?;
    for node in class_nodes {
        let Some(class) = lang.extract_class(node, bytes) else {
            continue;
        };
        class_ranges.push(class.byte_range);

        for method in &class.methods {
            units.push(SourceUnit {
                id: format!("{stem}.{}.{}", class.name, method.name),
                name: method.name.clone(),
                kind: UnitKind::Method,
                params: method.params.clone(),
                return_type: method.return_type.clone(),
                decorators: method.decorators.clone(),
                calls: Vec::new(),
                guards: method.guards.clone(),
                body: method.body.clone(),
                is_async: method.is_async,
                is_private: method.is_private,
                is_static: method.is_static,
                class_name: Some(class.name.clone()),
                line: method.line,
                end_line: method.end_line,
                byte_range: method.byte_range,
                file: file.to_string(),
                language: language.clone(),
            });
        }

        units.push(SourceUnit {
            id: format!("{stem}.{}", class.name),
            name: class.name.clone(),
            kind: UnitKind::Class,
            params: class.constructor_params.clone(),
            return_type: None,
            decorators: class.decorators.clone(),
            calls: Vec::new(),
            guards: Vec::new(),
            body: String::new(),
            is_async: false,
            is_private: class.is_private,
            is_static: false,
            class_name: None,
            line: class.line,
            end_line: class.end_line,
            byte_range: class.byte_range,
            file: file.to_string(),
            language: language.clone(),
        });
    }

    let function_nodes = query_nodes(
        tree,
        bytes,
        lang,
        "function",
        lang.function_query(),
        "function",
    )?;
    for node in function_nodes {
        let start = node.start_byte();
        // Methods are already extracted through their class.
        if class_ranges.iter().any(|(s, e)| start >= *s && start < *e) {
            continue;
        }
        let Some(func) = lang.extract_function(node, bytes) else {
            continue;
        };
        units.push(SourceUnit {
            id: format!("{stem}.{}", func.name),
            name: func.name.clone(),
            kind: UnitKind::Function,
            params: func.params,
            return_type: func.return_type,
            decorators: func.decorators,
            calls: Vec::new(),
            guards: func.guards,
            body: func.body,
            is_async: func.is_async,
            is_private: func.is_private,
            is_static: func.is_static,
            class_name: None,
            line: func.line,
            end_line: func.end_line,
            byte_range: func.byte_range,
            file: file.to_string(),
            language: language.clone(),
        });
    }

    Ok(units)
}

/// Assign call sites to the smallest enclosing non-class unit.
fn assign_calls(
    tree: &Tree,
    bytes: &[u8],
    lang: &dyn Language,
    units: &mut [SourceUnit],
) -> Result<()> {
    let call_nodes = query_nodes(tree, bytes, lang, "call", lang.call_query(), "call")?;

    for node in call_nodes {
        let Some(target) = lang.call_target(node, bytes) else {
            continue;
        };
        let start = node.start_byte();
        let line = node.start_position().row + 1;

        let owner = units
            .iter_mut()
            .filter(|u| {
                u.kind != UnitKind::Class && start >= u.byte_range.0 && start < u.byte_range.1
            })
            .min_by_key(|u| u.byte_range.1 - u.byte_range.0);
        if let Some(owner) = owner {
            owner.calls.push(CallSite { target, line });
        }
    }

    for unit in units.iter_mut() {
        unit.calls.sort_by(|a, b| (a.line, &a.target).cmp(&(b.line, &b.target)));
    }
    Ok(())
}

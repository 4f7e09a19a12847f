//! Language registry for name and extension lookup.
//!
//! Provides a singleton registry mapping language names and file extensions
//! to their [`Language`] implementations. Aliases let callers use common
//! shorthands ("py", "jvm") without knowing the canonical names.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::lang::traits::{BoxedLanguage, Language};
use crate::lang::{java, python};

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

/// Registry mapping names, extensions, and aliases to language handlers.
pub struct LanguageRegistry {
    by_name: HashMap<&'static str, BoxedLanguage>,
    by_ext: HashMap<&'static str, &'static str>,
    aliases: HashMap<&'static str, &'static str>,
}

impl LanguageRegistry {
    /// Get the global registry singleton.
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_ext: HashMap::new(),
            aliases: HashMap::new(),
        };

        registry.register(Box::new(python::Python));
        registry.register(Box::new(java::Java));

        registry.register_alias("py", "python");
        registry.register_alias("python3", "python");
        registry.register_alias("jvm", "java");

        registry
    }

    fn register(&mut self, lang: BoxedLanguage) {
        let name = lang.name();
        for ext in lang.extensions() {
            // Keyed without the dot so lookups accept both forms.
            self.by_ext.insert(ext.trim_start_matches('.'), name);
        }
        self.by_name.insert(name, lang);
    }

    fn register_alias(&mut self, alias: &'static str, target: &'static str) {
        self.aliases.insert(alias, target);
    }

    /// Get a language by name, resolving aliases.
    pub fn get_by_name(&self, name: &str) -> Option<&dyn Language> {
        let canonical = self.aliases.get(name).copied().unwrap_or(name);
        self.by_name.get(canonical).map(|b| b.as_ref())
    }

    /// Get a language by file extension, with or without the leading dot
    /// ("py" and ".py" both resolve).
    pub fn get_by_extension(&self, ext: &str) -> Option<&dyn Language> {
        self.by_ext
            .get(ext.trim_start_matches('.'))
            .and_then(|name| self.get_by_name(name))
    }

    /// Auto-detect a language from a file path extension.
    pub fn detect_language(&self, path: &Path) -> Option<&dyn Language> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    /// All canonical language names, sorted.
    pub fn supported_languages(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Check if a name is supported, including aliases.
    pub fn is_supported(&self, name: &str) -> bool {
        self.by_name.contains_key(name) || self.aliases.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_name_canonical() {
        let registry = LanguageRegistry::global();
        assert!(registry.get_by_name("python").is_some());
        assert!(registry.get_by_name("java").is_some());
        assert!(registry.get_by_name("cobol").is_none());
    }

    #[test]
    fn test_aliases_resolve() {
        let registry = LanguageRegistry::global();
        assert_eq!(registry.get_by_name("py").unwrap().name(), "python");
        assert_eq!(registry.get_by_name("jvm").unwrap().name(), "java");
        assert!(registry.is_supported("python3"));
    }

    #[test]
    fn test_extension_lookup() {
        let registry = LanguageRegistry::global();
        assert_eq!(registry.get_by_extension(".py").unwrap().name(), "python");
        assert_eq!(registry.get_by_extension(".java").unwrap().name(), "java");
        assert!(registry.get_by_extension(".rb").is_none());
    }

    #[test]
    fn test_extension_lookup_accepts_bare_form() {
        let registry = LanguageRegistry::global();
        assert_eq!(registry.get_by_extension("py").unwrap().name(), "python");
        assert_eq!(registry.get_by_extension("java").unwrap().name(), "java");
        assert!(registry.get_by_extension("rb").is_none());
    }

    #[test]
    fn test_detect_from_path() {
        let registry = LanguageRegistry::global();
        let lang = registry.detect_language(Path::new("src/app/views.py"));
        assert_eq!(lang.unwrap().name(), "python");
    }

    #[test]
    fn test_supported_languages_sorted() {
        let registry = LanguageRegistry::global();
        assert_eq!(registry.supported_languages(), vec!["java", "python"]);
    }
}

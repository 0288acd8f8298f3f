//! In-memory template catalogs.

use std::collections::HashMap;
use std::hash::Hash;

use missive_core::{MissingTemplate, TemplateSource};

/// String templates keyed by message key, with optional per-viewer overrides.
///
/// A viewer's own template wins over the default one for the same key.
#[derive(Debug, Clone)]
pub struct Catalog<V> {
    defaults: HashMap<String, String>,
    overrides: HashMap<V, HashMap<String, String>>,
}

impl<V> Default for Catalog<V> {
    fn default() -> Self {
        Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        }
    }
}

impl<V: Eq + Hash> Catalog<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default template.
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(key, template);
        self
    }

    /// Add a template used only for `viewer`.
    pub fn with_viewer_template(
        mut self,
        viewer: V,
        key: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.insert_for(viewer, key, template);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.defaults.insert(key.into(), template.into());
    }

    pub fn insert_for(&mut self, viewer: V, key: impl Into<String>, template: impl Into<String>) {
        self.overrides
            .entry(viewer)
            .or_default()
            .insert(key.into(), template.into());
    }

    /// The template `viewer` sees for `key`.
    pub fn lookup(&self, viewer: &V, key: &str) -> Option<&str> {
        self.overrides
            .get(viewer)
            .and_then(|templates| templates.get(key))
            .or_else(|| self.defaults.get(key))
            .map(String::as_str)
    }

    /// Default message keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.defaults.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of default templates.
    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.overrides.is_empty()
    }
}

impl<V> TemplateSource<V, String> for Catalog<V>
where
    V: Eq + Hash + Send + Sync,
{
    fn template_of(&self, viewer: &V, key: &str) -> Result<String, MissingTemplate> {
        self.lookup(viewer, key)
            .map(str::to_string)
            .ok_or_else(|| MissingTemplate::new(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog<String> {
        Catalog::new()
            .with_template("notice", "New mail from %author%")
            .with_viewer_template("pirate".to_string(), "notice", "Ahoy! %author% sent ye a letter")
    }

    #[test]
    fn default_template_is_used_without_override() {
        let template = catalog().template_of(&"ada".to_string(), "notice").unwrap();
        assert_eq!(template, "New mail from %author%");
    }

    #[test]
    fn viewer_override_wins() {
        let template = catalog().template_of(&"pirate".to_string(), "notice").unwrap();
        assert!(template.starts_with("Ahoy!"));
    }

    #[test]
    fn missing_key_reports_the_key() {
        let err = catalog().template_of(&"ada".to_string(), "farewell").unwrap_err();
        assert_eq!(err, MissingTemplate::new("farewell"));
    }

    #[test]
    fn keys_are_sorted() {
        let catalog: Catalog<String> = Catalog::new().with_template("b", "").with_template("a", "");
        assert_eq!(catalog.keys(), ["a", "b"]);
        assert_eq!(catalog.len(), 2);
    }
}

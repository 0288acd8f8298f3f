//! Delimiter-based string composition.

use std::fmt;

use missive_core::{Composer, MethodDescriptor, ReplacementMap, TypeKey};

pub const DEFAULT_PREFIX: &str = "%";
pub const DEFAULT_SUFFIX: &str = "%";

/// Replaces every `prefix + name + suffix` in the template with the string
/// form of that name's replacement, in replacement-map order.
///
/// Conversions at both ends are pluggable, so templates and messages need not
/// be plain strings.
pub struct StringComposer<T, M, R> {
    prefix: String,
    suffix: String,
    template_to_string: Box<dyn Fn(&T) -> String + Send + Sync>,
    string_to_message: Box<dyn Fn(String) -> M + Send + Sync>,
    replacement_to_string: Box<dyn Fn(&R) -> String + Send + Sync>,
}

impl<R: fmt::Display + 'static> StringComposer<String, String, R> {
    /// String templates in, string messages out, `%name%` placeholders.
    pub fn new() -> Self {
        Self::with_converters(Clone::clone, |s| s, ToString::to_string)
    }
}

impl<R: fmt::Display + 'static> Default for StringComposer<String, String, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, M, R> StringComposer<T, M, R> {
    pub fn with_converters(
        template_to_string: impl Fn(&T) -> String + Send + Sync + 'static,
        string_to_message: impl Fn(String) -> M + Send + Sync + 'static,
        replacement_to_string: impl Fn(&R) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            template_to_string: Box::new(template_to_string),
            string_to_message: Box::new(string_to_message),
            replacement_to_string: Box::new(replacement_to_string),
        }
    }

    /// Use `prefix` and `suffix` around placeholder names.
    pub fn delimiters(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Apply `replacements` to `template`.
    pub fn render(&self, template: &T, replacements: &ReplacementMap<R>) -> M {
        let mut text = (self.template_to_string)(template);
        for (name, replacement) in replacements {
            let placeholder = format!("{}{}{}", self.prefix, name, self.suffix);
            text = text.replace(&placeholder, &(self.replacement_to_string)(replacement));
        }
        (self.string_to_message)(text)
    }
}

impl<V, T, M, R> Composer<V, T, R, M> for StringComposer<T, M, R> {
    fn compose(
        &self,
        _viewer: &V,
        template: &T,
        replacements: &ReplacementMap<R>,
        _method: &MethodDescriptor,
        _contract: &TypeKey,
    ) -> M {
        self.render(template, replacements)
    }
}

impl<T, M, R> fmt::Debug for StringComposer<T, M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringComposer")
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

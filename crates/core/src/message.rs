//! Message collaborators: where templates come from, how they are composed
//! and how the result is delivered.

use crate::error::{BoxError, MissingTemplate};
use crate::method::MethodDescriptor;
use crate::types::TypeKey;
use crate::variable::ReplacementMap;

/// Supplies the template of a message key, possibly per viewer.
pub trait TemplateSource<V, T>: Send + Sync {
    fn template_of(&self, viewer: &V, key: &str) -> Result<T, MissingTemplate>;
}

impl<V, T, F> TemplateSource<V, T> for F
where
    F: Fn(&V, &str) -> Result<T, MissingTemplate> + Send + Sync,
{
    fn template_of(&self, viewer: &V, key: &str) -> Result<T, MissingTemplate> {
        self(viewer, key)
    }
}

/// Composes a template and its replacements into a final message.
///
/// Must be infallible and free of side effects; anything that can fail
/// belongs in a resolver or the template source.
pub trait Composer<V, T, R, M>: Send + Sync {
    fn compose(
        &self,
        viewer: &V,
        template: &T,
        replacements: &ReplacementMap<R>,
        method: &MethodDescriptor,
        contract: &TypeKey,
    ) -> M;
}

impl<V, T, R, M, F> Composer<V, T, R, M> for F
where
    F: Fn(&V, &T, &ReplacementMap<R>, &MethodDescriptor, &TypeKey) -> M + Send + Sync,
{
    fn compose(
        &self,
        viewer: &V,
        template: &T,
        replacements: &ReplacementMap<R>,
        method: &MethodDescriptor,
        contract: &TypeKey,
    ) -> M {
        self(viewer, template, replacements, method, contract)
    }
}

/// Delivers a composed message to its viewer.
pub trait Sender<V, M>: Send + Sync {
    fn send(&self, viewer: &V, message: M) -> Result<(), BoxError>;
}

impl<V, M, F> Sender<V, M> for F
where
    F: Fn(&V, M) -> Result<(), BoxError> + Send + Sync,
{
    fn send(&self, viewer: &V, message: M) -> Result<(), BoxError> {
        self(viewer, message)
    }
}

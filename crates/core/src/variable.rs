//! Template variables — the values resolvers produce and the traits that
//! produce them.
//!
//! A resolver turns one named value into a [`ResolutionOutcome`]: a set of
//! names that are either finished ([`Variable::Conclusion`]) or still need
//! resolving under some type ([`Variable::Continuation`]). A
//! [`VariableResolution`] strategy drives resolvers until nothing is pending.

use indexmap::IndexMap;

use crate::error::{BoxError, Result};
use crate::method::MethodDescriptor;
use crate::types::{TypeKey, Typed};
use crate::value::{Arguments, Value};
use crate::weighted::{FrozenTypedRegistry, TypedRegistry};

/// The final `name → replacement` mapping handed to composition.
pub type ReplacementMap<R> = IndexMap<String, R>;

/// A value still awaiting resolution; `declared` picks the eligible resolvers.
#[derive(Debug, Clone)]
pub struct Continuation {
    pub value: Value,
    pub declared: TypeKey,
}

impl Continuation {
    pub fn new(value: Value, declared: impl Into<TypeKey>) -> Self {
        Self {
            value,
            declared: declared.into(),
        }
    }

    /// Continue with a [`Typed`] value under its own type.
    pub fn typed<T: Typed>(value: T) -> Self {
        let value = Value::new(value);
        let declared = value.type_key().clone();
        Self { value, declared }
    }
}

/// One produced variable: terminal or still pending.
#[derive(Debug, Clone)]
pub enum Variable<R> {
    Conclusion(R),
    Continuation(Continuation),
}

impl<R> Variable<R> {
    pub fn is_conclusion(&self) -> bool {
        matches!(self, Variable::Conclusion(_))
    }
}

/// What a resolver produced when it accepted a value.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome<R> {
    variables: IndexMap<String, Variable<R>>,
}

impl<R> Default for ResolutionOutcome<R> {
    fn default() -> Self {
        Self {
            variables: IndexMap::new(),
        }
    }
}

impl<R> ResolutionOutcome<R> {
    /// An accepted, empty outcome: the value contributes no replacements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished replacement.
    pub fn conclude(mut self, name: impl Into<String>, replacement: R) -> Self {
        self.variables
            .insert(name.into(), Variable::Conclusion(replacement));
        self
    }

    /// Add a value that needs further resolution as `declared`.
    pub fn continue_as(
        mut self,
        name: impl Into<String>,
        value: Value,
        declared: impl Into<TypeKey>,
    ) -> Self {
        self.variables.insert(
            name.into(),
            Variable::Continuation(Continuation::new(value, declared)),
        );
        self
    }

    /// Add a [`Typed`] value that needs further resolution under its own type.
    pub fn continue_typed<T: Typed>(mut self, name: impl Into<String>, value: T) -> Self {
        self.variables
            .insert(name.into(), Variable::Continuation(Continuation::typed(value)));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, variable: Variable<R>) {
        self.variables.insert(name.into(), variable);
    }

    pub fn get(&self, name: &str) -> Option<&Variable<R>> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl<R> IntoIterator for ResolutionOutcome<R> {
    type Item = (String, Variable<R>);
    type IntoIter = indexmap::map::IntoIter<String, Variable<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.into_iter()
    }
}

/// Everything a resolver may inspect about the call it resolves for.
#[derive(Debug)]
pub struct ResolveContext<'a, V> {
    /// The eventual viewer of the message.
    pub viewer: &'a V,
    /// The contract the invoked method belongs to.
    pub contract: &'a TypeKey,
    pub method: &'a MethodDescriptor,
    pub args: &'a Arguments,
}

impl<V> Clone for ResolveContext<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ResolveContext<'_, V> {}

/// Turns a named value into replacements.
///
/// Returning `Ok(None)` declines: the next resolver (or ancestor type) gets a
/// chance. Errors are surfaced to the caller unmodified.
pub trait VariableResolver<V, R>: Send + Sync {
    fn resolve(
        &self,
        name: &str,
        value: &Value,
        cx: &ResolveContext<'_, V>,
    ) -> std::result::Result<Option<ResolutionOutcome<R>>, BoxError>;
}

impl<V, R, F> VariableResolver<V, R> for F
where
    F: Fn(&str, &Value, &ResolveContext<'_, V>) -> std::result::Result<Option<ResolutionOutcome<R>>, BoxError>
        + Send
        + Sync,
{
    fn resolve(
        &self,
        name: &str,
        value: &Value,
        cx: &ResolveContext<'_, V>,
    ) -> std::result::Result<Option<ResolutionOutcome<R>>, BoxError> {
        self(name, value, cx)
    }
}

/// Resolvers keyed by the declared type they handle.
pub type ResolverRegistry<V, R> = TypedRegistry<dyn VariableResolver<V, R>>;

/// The frozen form of [`ResolverRegistry`].
pub type FrozenResolverRegistry<V, R> = FrozenTypedRegistry<dyn VariableResolver<V, R>>;

/// Input of one [`VariableResolution`] pass.
pub struct ResolutionRequest<'a, V, T, R> {
    pub resolvers: &'a FrozenResolverRegistry<V, R>,
    pub viewer: &'a V,
    /// The located template; lets a strategy skip work when nothing is used.
    pub template: &'a T,
    pub contract: &'a TypeKey,
    pub method: &'a MethodDescriptor,
    pub args: &'a Arguments,
}

impl<'a, V, T, R> ResolutionRequest<'a, V, T, R> {
    pub fn context(&self) -> ResolveContext<'a, V> {
        ResolveContext {
            viewer: self.viewer,
            contract: self.contract,
            method: self.method,
            args: self.args,
        }
    }
}

/// Strategy that turns an invocation's template arguments into the final
/// [`ReplacementMap`].
pub trait VariableResolution<V, T, R>: Send + Sync {
    fn resolve_variables(&self, request: &ResolutionRequest<'_, V, T, R>) -> Result<ReplacementMap<R>>;
}

impl<V, T, R, F> VariableResolution<V, T, R> for F
where
    F: Fn(&ResolutionRequest<'_, V, T, R>) -> Result<ReplacementMap<R>> + Send + Sync,
{
    fn resolve_variables(&self, request: &ResolutionRequest<'_, V, T, R>) -> Result<ReplacementMap<R>> {
        self(request)
    }
}

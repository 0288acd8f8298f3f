//! The frozen configuration behind a [`Missive`](crate::Missive) handle.
//!
//! Everything in here is read-only after [`Builder::freeze`](crate::Builder::freeze);
//! concurrent invocations share it without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use missive_core::{
    Arguments, BoundMethod, Composer, ContractDescriptor, FrozenRegistry, FrozenResolverRegistry,
    LocatorResolver, Result, Sender, TemplateSource, VariableResolution,
};

use crate::missive::{Missive, Reply};
use crate::scanner::BoundMethods;

/// The implementation of a default-bodied method.
///
/// Receives the handle it was invoked on, so it can delegate to templated
/// methods of the same contract.
pub type DefaultBody<V, T, M, R> =
    Arc<dyn Fn(&Missive<V, T, M, R>, &Arguments) -> Result<Reply<V, T, M, R>> + Send + Sync>;

/// An immutable, validated contract configuration.
pub struct Configuration<V, T, M, R> {
    pub(crate) id: Uuid,
    pub(crate) contract: ContractDescriptor,
    pub(crate) bound: BoundMethods<V>,
    pub(crate) default_bodies: HashMap<String, DefaultBody<V, T, M, R>>,
    pub(crate) locator_resolvers: FrozenRegistry<dyn LocatorResolver<V>>,
    pub(crate) resolvers: FrozenResolverRegistry<V, R>,
    pub(crate) resolution: Arc<dyn VariableResolution<V, T, R>>,
    pub(crate) template_source: Arc<dyn TemplateSource<V, T>>,
    pub(crate) composer: Arc<dyn Composer<V, T, R, M>>,
    pub(crate) sender: Arc<dyn Sender<V, M>>,
}

impl<V, T, M, R> Configuration<V, T, M, R> {
    /// Identity token of this configuration; stable for its lifetime.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }

    /// The binding of a templated method.
    pub fn bound(&self, method: &str) -> Option<&BoundMethod<V>> {
        self.bound.get(method)
    }

    /// All templated methods, in declaration order.
    pub fn bound_methods(&self) -> impl Iterator<Item = &BoundMethod<V>> {
        self.bound.values()
    }

    /// Names of the methods with a default body, sorted.
    pub fn default_methods(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.default_bodies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn locator_resolvers(&self) -> &FrozenRegistry<dyn LocatorResolver<V>> {
        &self.locator_resolvers
    }

    pub fn resolvers(&self) -> &FrozenResolverRegistry<V, R> {
        &self.resolvers
    }
}

impl<V, T, M, R> fmt::Debug for Configuration<V, T, M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("id", &self.id)
            .field("contract", &self.contract.name)
            .field("bound", &self.bound.keys().collect::<Vec<_>>())
            .field("default_methods", &self.default_methods())
            .field("locator_resolvers", &self.locator_resolvers.len())
            .field("resolvers", &self.resolvers.len())
            .finish_non_exhaustive()
    }
}

//! Configuration assembly.
//!
//! A [`Builder`] collects collaborators and registries, then [`Builder::freeze`]
//! validates everything, scans the contract and hands back an immutable
//! [`Missive`] handle. Registration problems are remembered and reported by
//! `freeze`, so a half-configured instance never escapes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use missive_core::{
    Arguments, Composer, ConfigError, ContractDescriptor, LocatorResolver, ResolverRegistry, Result,
    Sender, SupertypeStrategy, TemplateSource, TypeGraph, TypeKey, VariableResolution,
    VariableResolver, WeightedRegistry,
};

use crate::configuration::{Configuration, DefaultBody};
use crate::hierarchy::SuperclassFirst;
use crate::missive::{Missive, Reply};
use crate::resolution::StandardResolution;
use crate::scanner::scan_contract;

/// Builds a [`Missive`] for one contract.
///
/// `V` is the viewer, `T` the template, `M` the composed message and `R` a
/// resolved replacement.
pub struct Builder<V, T, M, R> {
    contract: ContractDescriptor,
    locator_resolvers: WeightedRegistry<dyn LocatorResolver<V>>,
    resolvers: ResolverRegistry<V, R>,
    default_bodies: HashMap<String, DefaultBody<V, T, M, R>>,
    template_source: Option<Arc<dyn TemplateSource<V, T>>>,
    composer: Option<Arc<dyn Composer<V, T, R, M>>>,
    sender: Option<Arc<dyn Sender<V, M>>>,
    resolution: Option<Arc<dyn VariableResolution<V, T, R>>>,
    strategy: Option<Arc<dyn SupertypeStrategy>>,
    error: Option<ConfigError>,
}

impl<V, T, M, R> Builder<V, T, M, R>
where
    V: 'static,
    T: 'static,
    M: 'static,
    R: 'static,
{
    pub fn new(contract: ContractDescriptor) -> Self {
        Self {
            contract,
            locator_resolvers: WeightedRegistry::new(),
            resolvers: ResolverRegistry::new(),
            default_bodies: HashMap::new(),
            template_source: None,
            composer: None,
            sender: None,
            resolution: None,
            strategy: None,
            error: None,
        }
    }

    /// Register a viewer locator resolver. Higher priorities are asked first.
    pub fn locator_resolver(self, priority: i32, resolver: impl LocatorResolver<V> + 'static) -> Self {
        self.locator_resolver_arc(priority, Arc::new(resolver))
    }

    pub fn locator_resolver_arc(mut self, priority: i32, resolver: Arc<dyn LocatorResolver<V>>) -> Self {
        let result = self.locator_resolvers.insert(priority, resolver);
        self.remember(result);
        self
    }

    /// Register a variable resolver for values of type `ty`.
    pub fn resolver(
        self,
        ty: impl Into<TypeKey>,
        priority: i32,
        resolver: impl VariableResolver<V, R> + 'static,
    ) -> Self {
        self.resolver_arc(ty, priority, Arc::new(resolver))
    }

    pub fn resolver_arc(
        mut self,
        ty: impl Into<TypeKey>,
        priority: i32,
        resolver: Arc<dyn VariableResolver<V, R>>,
    ) -> Self {
        let result = self.resolvers.insert(ty.into(), priority, resolver);
        self.remember(result);
        self
    }

    /// Supply the body of a default method.
    pub fn default_body<F>(mut self, method: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Missive<V, T, M, R>, &Arguments) -> Result<Reply<V, T, M, R>> + Send + Sync + 'static,
    {
        self.default_bodies.insert(method.into(), Arc::new(body));
        self
    }

    pub fn template_source(mut self, source: impl TemplateSource<V, T> + 'static) -> Self {
        self.template_source = Some(Arc::new(source));
        self
    }

    pub fn composer(mut self, composer: impl Composer<V, T, R, M> + 'static) -> Self {
        self.composer = Some(Arc::new(composer));
        self
    }

    pub fn sender(mut self, sender: impl Sender<V, M> + 'static) -> Self {
        self.sender = Some(Arc::new(sender));
        self
    }

    /// Replace the standard resolution strategy.
    pub fn resolution(mut self, resolution: impl VariableResolution<V, T, R> + 'static) -> Self {
        self.resolution = Some(Arc::new(resolution));
        self
    }

    /// Supertype policy for the standard resolution strategy.
    ///
    /// Defaults to [`SuperclassFirst`] over an empty [`TypeGraph`], i.e. exact
    /// type matches only. Ignored when a custom resolution is set.
    pub fn supertypes(mut self, strategy: impl SupertypeStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Validate, scan and freeze into an immutable handle.
    pub fn freeze(self) -> Result<Missive<V, T, M, R>> {
        if let Some(err) = self.error {
            return Err(err.into());
        }

        let template_source = self
            .template_source
            .ok_or(ConfigError::MissingComponent("template source"))?;
        let composer = self.composer.ok_or(ConfigError::MissingComponent("composer"))?;
        let sender = self.sender.ok_or(ConfigError::MissingComponent("sender"))?;

        let resolution: Arc<dyn VariableResolution<V, T, R>> = match self.resolution {
            Some(resolution) => resolution,
            None => {
                let strategy: Arc<dyn SupertypeStrategy> = match self.strategy {
                    Some(strategy) => strategy,
                    None => Arc::new(SuperclassFirst::new(Arc::new(TypeGraph::new()))),
                };
                Arc::new(StandardResolution::new(strategy))
            }
        };

        let locator_resolvers = self.locator_resolvers.freeze();
        let bound = scan_contract(
            &self.contract,
            &locator_resolvers,
            self.default_bodies.keys().map(String::as_str),
        )?;

        let configuration = Configuration {
            id: Uuid::new_v4(),
            bound,
            default_bodies: self.default_bodies,
            locator_resolvers,
            resolvers: self.resolvers.freeze(),
            resolution,
            template_source,
            composer,
            sender,
            contract: self.contract,
        };

        info!(
            contract = %configuration.contract.name,
            id = %configuration.id,
            methods = configuration.contract.methods.len(),
            bound = configuration.bound.len(),
            resolvers = configuration.resolvers.len(),
            "Configuration frozen"
        );

        Ok(Missive::from_configuration(Arc::new(configuration)))
    }

    // ── Internal ──────────────────────────────────────────────

    fn remember(&mut self, result: std::result::Result<(), ConfigError>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

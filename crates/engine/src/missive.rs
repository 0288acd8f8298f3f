//! The contract handle and its invocation pipeline.
//!
//! Per call: configuration accessors return the configuration, default
//! methods run their body, and every other method goes viewer → template →
//! variable resolution → composition, then is sent or returned.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::{debug, warn};

use missive_core::{
    Arguments, BoundMethod, ContractDescriptor, Error, Invocation, MethodDescriptor, ReplacementMap,
    ResolutionRequest, Result, Returns,
};

use crate::builder::Builder;
use crate::configuration::Configuration;

/// What an invocation handed back.
pub enum Reply<V, T, M, R> {
    /// The message was composed and delivered.
    Sent,
    /// The composed message, not delivered.
    Message(M),
    /// The configuration behind the handle.
    Configuration(Arc<Configuration<V, T, M, R>>),
}

impl<V, T, M, R> Reply<V, T, M, R> {
    pub fn is_sent(&self) -> bool {
        matches!(self, Reply::Sent)
    }

    pub fn into_message(self) -> Option<M> {
        match self {
            Reply::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn into_configuration(self) -> Option<Arc<Configuration<V, T, M, R>>> {
        match self {
            Reply::Configuration(configuration) => Some(configuration),
            _ => None,
        }
    }
}

impl<V, T, M: fmt::Debug, R> fmt::Debug for Reply<V, T, M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Sent => f.write_str("Sent"),
            Reply::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Reply::Configuration(configuration) => {
                f.debug_tuple("Configuration").field(&configuration.id).finish()
            }
        }
    }
}

/// The resolved inputs of one message, before composition.
#[derive(Debug)]
pub struct Prepared<V, T, R> {
    pub viewer: V,
    pub template: T,
    pub replacements: ReplacementMap<R>,
}

/// A configured contract instance.
///
/// Cheap to clone; clones share the frozen configuration and compare equal.
/// Safe to invoke from many threads at once.
pub struct Missive<V, T, M, R> {
    configuration: Arc<Configuration<V, T, M, R>>,
}

impl<V, T, M, R> Missive<V, T, M, R>
where
    V: 'static,
    T: 'static,
    M: 'static,
    R: 'static,
{
    /// Start configuring an instance of `contract`.
    pub fn builder(contract: ContractDescriptor) -> Builder<V, T, M, R> {
        Builder::new(contract)
    }
}

impl<V, T, M, R> Missive<V, T, M, R> {
    pub(crate) fn from_configuration(configuration: Arc<Configuration<V, T, M, R>>) -> Self {
        Self { configuration }
    }

    /// The frozen configuration, for diagnostics.
    pub fn configuration(&self) -> &Arc<Configuration<V, T, M, R>> {
        &self.configuration
    }

    /// Invoke a contract method by name.
    pub fn invoke(&self, method: &str, args: Arguments) -> Result<Reply<V, T, M, R>> {
        debug!(contract = %self.contract_name(), method = %method, args = args.len(), "Invoking");
        let result = self.dispatch(method, &args);
        if let Err(err) = &result {
            warn!(contract = %self.contract_name(), method = %method, error = %err, "Invocation failed");
        }
        result
    }

    /// Run the pipeline of a templated method and return the composed
    /// message without sending it, whatever the method returns.
    pub fn render(&self, method: &str, args: Arguments) -> Result<M> {
        let bound = self.bound(method)?;
        let prepared = self.prepare_bound(bound, &args)?;
        Ok(self.compose(bound, &prepared))
    }

    /// Run the pipeline of a templated method and send the composed message,
    /// whatever the method returns.
    pub fn send(&self, method: &str, args: Arguments) -> Result<()> {
        let bound = self.bound(method)?;
        let prepared = self.prepare_bound(bound, &args)?;
        let message = self.compose(bound, &prepared);
        self.configuration
            .sender
            .send(&prepared.viewer, message)
            .map_err(Error::Collaborator)
    }

    /// Locate the viewer and template and resolve the variables of a
    /// templated method, stopping short of composition.
    pub fn prepare(&self, method: &str, args: &Arguments) -> Result<Prepared<V, T, R>> {
        let bound = self.bound(method)?;
        self.prepare_bound(bound, args)
    }

    // ── Internal ──────────────────────────────────────────────

    fn contract_name(&self) -> &str {
        self.configuration.contract.name.as_str()
    }

    fn dispatch(&self, method: &str, args: &Arguments) -> Result<Reply<V, T, M, R>> {
        let descriptor = self.descriptor(method)?;

        if descriptor.returns == Returns::Configuration {
            return Ok(Reply::Configuration(Arc::clone(&self.configuration)));
        }

        if descriptor.default_body {
            let body = self
                .configuration
                .default_bodies
                .get(method)
                .ok_or_else(|| self.unmapped(method))?;
            return body(self, args);
        }

        let bound = self.bound(method)?;
        let prepared = self.prepare_bound(bound, args)?;
        let message = self.compose(bound, &prepared);

        match descriptor.returns {
            Returns::Unit => {
                self.configuration
                    .sender
                    .send(&prepared.viewer, message)
                    .map_err(Error::Collaborator)?;
                Ok(Reply::Sent)
            }
            Returns::Message => Ok(Reply::Message(message)),
            Returns::Configuration => Ok(Reply::Configuration(Arc::clone(&self.configuration))),
        }
    }

    fn prepare_bound(&self, bound: &BoundMethod<V>, args: &Arguments) -> Result<Prepared<V, T, R>> {
        let configuration = &*self.configuration;
        let contract = &configuration.contract.name;
        let method = &bound.descriptor;

        let invocation = Invocation {
            contract,
            method,
            args,
        };
        let viewer = bound
            .locator
            .lookup(&invocation)
            .map_err(|source| Error::ViewerNotFound {
                contract: contract.clone(),
                method: method.name.clone(),
                source,
            })?;

        let template = configuration
            .template_source
            .template_of(&viewer, &bound.message_key)
            .map_err(|source| Error::MissingTemplate {
                contract: contract.clone(),
                method: method.name.clone(),
                source,
            })?;

        let replacements = configuration.resolution.resolve_variables(&ResolutionRequest {
            resolvers: &configuration.resolvers,
            viewer: &viewer,
            template: &template,
            contract,
            method,
            args,
        })?;

        debug!(
            contract = %contract,
            method = %method.name,
            key = %bound.message_key,
            replacements = replacements.len(),
            "Resolved variables"
        );

        Ok(Prepared {
            viewer,
            template,
            replacements,
        })
    }

    fn compose(&self, bound: &BoundMethod<V>, prepared: &Prepared<V, T, R>) -> M {
        self.configuration.composer.compose(
            &prepared.viewer,
            &prepared.template,
            &prepared.replacements,
            &bound.descriptor,
            &self.configuration.contract.name,
        )
    }

    fn descriptor(&self, method: &str) -> Result<&MethodDescriptor> {
        self.configuration
            .contract
            .find(method)
            .ok_or_else(|| self.unmapped(method))
    }

    fn bound(&self, method: &str) -> Result<&BoundMethod<V>> {
        self.configuration
            .bound
            .get(method)
            .ok_or_else(|| self.unmapped(method))
    }

    fn unmapped(&self, method: &str) -> Error {
        Error::UnmappedMethod {
            contract: self.configuration.contract.name.clone(),
            method: method.to_string(),
        }
    }
}

impl<V, T, M, R> Clone for Missive<V, T, M, R> {
    fn clone(&self) -> Self {
        Self {
            configuration: Arc::clone(&self.configuration),
        }
    }
}

impl<V, T, M, R> PartialEq for Missive<V, T, M, R> {
    fn eq(&self, other: &Self) -> bool {
        self.configuration.id == other.configuration.id
    }
}

impl<V, T, M, R> Eq for Missive<V, T, M, R> {}

impl<V, T, M, R> PartialEq<Configuration<V, T, M, R>> for Missive<V, T, M, R> {
    fn eq(&self, other: &Configuration<V, T, M, R>) -> bool {
        self.configuration.id == other.id
    }
}

impl<V, T, M, R> Hash for Missive<V, T, M, R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.configuration.id.hash(state);
    }
}

impl<V, T, M, R> fmt::Display for Missive<V, T, M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.configuration.contract.name, self.configuration.id)
    }
}

impl<V, T, M, R> fmt::Debug for Missive<V, T, M, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Missive")
            .field("contract", &self.configuration.contract.name)
            .field("id", &self.configuration.id)
            .finish()
    }
}

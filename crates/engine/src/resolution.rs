//! The standard variable resolution strategy.
//!
//! Template arguments enter a pending set under their resolution names. The
//! first pending entry is offered to the resolvers registered for its type,
//! then for each ancestor the [`SupertypeStrategy`] yields, highest priority
//! first. The first resolver to accept consumes the entry; its conclusions are
//! finalised and its continuations join the pending set. The scan then starts
//! over from the first pending entry, until nothing is pending.
//!
//! A resolver that keeps re-emitting its own input as a continuation never
//! lets the pending set drain. Unless a step limit is configured with
//! [`StandardResolution::with_max_steps`], such a call does not return.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use missive_core::{
    Continuation, Error, FrozenResolverRegistry, ReplacementMap, ResolutionOutcome,
    ResolutionRequest, ResolveContext, Result, SupertypeStrategy, Value, Variable,
    VariableResolution,
};

/// Worklist resolution over a per-type resolver registry.
#[derive(Clone)]
pub struct StandardResolution {
    strategy: Arc<dyn SupertypeStrategy>,
    max_steps: Option<usize>,
}

impl StandardResolution {
    pub fn new(strategy: Arc<dyn SupertypeStrategy>) -> Self {
        Self {
            strategy,
            max_steps: None,
        }
    }

    /// Fail a call with [`Error::ResolutionLimit`] once more than `limit`
    /// resolver acceptances happened in it.
    pub fn with_max_steps(mut self, limit: usize) -> Self {
        self.max_steps = Some(limit);
        self
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    pub fn strategy(&self) -> &Arc<dyn SupertypeStrategy> {
        &self.strategy
    }

    /// Offer one pending value to every eligible resolver, exact type first.
    fn dispatch<V, R>(
        &self,
        resolvers: &FrozenResolverRegistry<V, R>,
        name: &str,
        pending: &Continuation,
        cx: &ResolveContext<'_, V>,
    ) -> Result<Option<ResolutionOutcome<R>>> {
        let dispatch_order =
            std::iter::once(pending.declared.clone()).chain(self.strategy.hierarchy_of(&pending.declared));

        for ty in dispatch_order {
            for entry in resolvers.entries_for(&ty) {
                let outcome = entry
                    .value()
                    .resolve(name, &pending.value, cx)
                    .map_err(Error::Collaborator)?;

                match outcome {
                    Some(outcome) => {
                        trace!(
                            placeholder = %name,
                            dispatch_type = %ty,
                            priority = entry.priority(),
                            produced = outcome.len(),
                            "Resolver accepted"
                        );
                        return Ok(Some(outcome));
                    }
                    None => {
                        trace!(
                            placeholder = %name,
                            dispatch_type = %ty,
                            priority = entry.priority(),
                            "Resolver declined"
                        );
                    }
                }
            }
        }

        Ok(None)
    }
}

impl std::fmt::Debug for StandardResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardResolution")
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl<V, T, R> VariableResolution<V, T, R> for StandardResolution {
    fn resolve_variables(&self, request: &ResolutionRequest<'_, V, T, R>) -> Result<ReplacementMap<R>> {
        let cx = request.context();
        let mut pending = self.seed(request);
        let mut finalised = ReplacementMap::new();
        let mut steps = 0usize;

        while let Some((name, continuation)) = pending.first() {
            if let Some(limit) = self.max_steps {
                if steps >= limit {
                    return Err(Error::ResolutionLimit {
                        contract: request.contract.clone(),
                        method: request.method.name.clone(),
                        limit,
                    });
                }
            }

            let Some(outcome) = self.dispatch(request.resolvers, name, continuation, &cx)? else {
                return Err(unresolved(request, name, &continuation.value));
            };
            steps += 1;

            let name = name.clone();
            pending.shift_remove(&name);

            for (produced, variable) in outcome {
                match variable {
                    Variable::Conclusion(replacement) => {
                        pending.shift_remove(&produced);
                        finalised.insert(produced, replacement);
                    }
                    // Dispatched on its declared type as given, which may
                    // re-tag the value for another type's resolvers.
                    Variable::Continuation(next) => {
                        finalised.shift_remove(&produced);
                        pending.insert(produced, next);
                    }
                }
            }
        }

        Ok(finalised)
    }
}

impl StandardResolution {
    /// Every present template argument, under its narrowed type.
    fn seed<V, T, R>(&self, request: &ResolutionRequest<'_, V, T, R>) -> IndexMap<String, Continuation> {
        let mut pending = IndexMap::new();
        for (param, arg) in request.method.params.iter().zip(request.args.iter()) {
            let (Some(name), Some(value)) = (param.resolution_name(), arg) else {
                continue;
            };
            let declared = self.strategy.narrow(&param.declared, value.type_key());
            pending.insert(name.to_string(), Continuation::new(value.clone(), declared));
        }
        pending
    }
}

fn unresolved<V, T, R>(request: &ResolutionRequest<'_, V, T, R>, name: &str, value: &Value) -> Error {
    Error::Unresolved {
        contract: request.contract.clone(),
        method: request.method.name.clone(),
        placeholder: name.to_string(),
        value: format!("{value:?}"),
    }
}

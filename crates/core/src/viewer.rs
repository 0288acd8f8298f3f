//! Viewer lookup — who a message is for.
//!
//! A [`LocatorResolver`] is consulted once per contract method when a
//! configuration is frozen and hands back the [`ViewerLocator`] that method
//! will use on every call.

use std::sync::Arc;

use crate::error::ViewerNotFound;
use crate::method::MethodDescriptor;
use crate::types::TypeKey;
use crate::value::Arguments;

/// The call a viewer is being located for.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub contract: &'a TypeKey,
    pub method: &'a MethodDescriptor,
    pub args: &'a Arguments,
}

/// Locates the viewer of one invocation.
///
/// When a viewer is deliberately absent, return a no-op viewer rather than an
/// error; [`ViewerNotFound`] aborts the call.
pub trait ViewerLocator<V>: Send + Sync {
    fn lookup(&self, invocation: &Invocation<'_>) -> Result<V, ViewerNotFound>;
}

impl<V, F> ViewerLocator<V> for F
where
    F: Fn(&Invocation<'_>) -> Result<V, ViewerNotFound> + Send + Sync,
{
    fn lookup(&self, invocation: &Invocation<'_>) -> Result<V, ViewerNotFound> {
        self(invocation)
    }
}

/// Picks the [`ViewerLocator`] for a method, or declines with `None`.
pub trait LocatorResolver<V>: Send + Sync {
    fn resolve(
        &self,
        method: &MethodDescriptor,
        contract: &TypeKey,
    ) -> Option<Arc<dyn ViewerLocator<V>>>;
}

impl<V, F> LocatorResolver<V> for F
where
    F: Fn(&MethodDescriptor, &TypeKey) -> Option<Arc<dyn ViewerLocator<V>>> + Send + Sync,
{
    fn resolve(
        &self,
        method: &MethodDescriptor,
        contract: &TypeKey,
    ) -> Option<Arc<dyn ViewerLocator<V>>> {
        self(method, contract)
    }
}

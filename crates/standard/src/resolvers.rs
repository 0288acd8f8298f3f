//! Ready-made variable resolvers.
//!
//! Each one downcasts the value it is offered and declines when the payload
//! is not the Rust type it expects, so the next resolver gets its turn.

use std::any::Any;
use std::fmt;

use missive_core::{BoxError, ResolutionOutcome, ResolveContext, Value, VariableResolver};

/// Conclude a `T` as itself, under the name it was offered with.
pub fn identity_resolver<V, T>() -> impl VariableResolver<V, T>
where
    T: Any + Clone + Send + Sync,
{
    |name: &str, value: &Value, _cx: &ResolveContext<'_, V>| -> Result<Option<ResolutionOutcome<T>>, BoxError> {
        Ok(value
            .downcast_ref::<T>()
            .map(|inner| ResolutionOutcome::new().conclude(name, inner.clone())))
    }
}

/// Conclude a `T` as its [`Display`](fmt::Display) form.
pub fn display_resolver<V, T>() -> impl VariableResolver<V, String>
where
    T: Any + fmt::Display,
{
    |name: &str, value: &Value, _cx: &ResolveContext<'_, V>| -> Result<Option<ResolutionOutcome<String>>, BoxError> {
        Ok(value
            .downcast_ref::<T>()
            .map(|inner| ResolutionOutcome::new().conclude(name, inner.to_string())))
    }
}

/// Resolve a `T` with `f`, which sees the downcast payload directly.
pub fn typed_resolver<V, R, T, F>(f: F) -> impl VariableResolver<V, R>
where
    T: Any,
    F: Fn(&str, &T, &ResolveContext<'_, V>) -> Result<Option<ResolutionOutcome<R>>, BoxError>
        + Send
        + Sync,
{
    move |name: &str, value: &Value, cx: &ResolveContext<'_, V>| -> Result<Option<ResolutionOutcome<R>>, BoxError> {
        match value.downcast_ref::<T>() {
            Some(inner) => f(name, inner, cx),
            None => Ok(None),
        }
    }
}

//! Dynamically typed values and invocation arguments.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::{TypeKey, Typed};

/// Anything that can be carried inside a [`Value`].
pub trait Payload: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value tagged with its runtime type.
///
/// Cloning is cheap: the payload is shared.
#[derive(Clone)]
pub struct Value {
    ty: TypeKey,
    payload: Arc<dyn Payload>,
}

impl Value {
    /// Wrap a [`Typed`] value under its own type key.
    pub fn new<T: Typed>(value: T) -> Self {
        Self {
            ty: T::type_key(),
            payload: Arc::new(value),
        }
    }

    /// Wrap any value under an explicit runtime type key.
    pub fn tagged<T: Payload>(ty: impl Into<TypeKey>, value: T) -> Self {
        Self {
            ty: ty.into(),
            payload: Arc::new(value),
        }
    }

    /// The runtime type of this value.
    pub fn type_key(&self) -> &TypeKey {
        &self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let payload: &dyn Payload = &*self.payload;
        payload.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Whether both values share the same payload allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.payload, self.ty)
    }
}

impl<T: Typed> From<T> for Value {
    fn from(value: T) -> Self {
        Value::new(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(value.to_string())
    }
}

/// Positional arguments of one invocation; `None` is a null argument.
#[derive(Debug, Clone, Default)]
pub struct Arguments(Vec<Option<Value>>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a present argument.
    pub fn with(mut self, value: impl Into<Value>) -> Self {
        self.0.push(Some(value.into()));
        self
    }

    /// Append a null argument.
    pub fn with_null(mut self) -> Self {
        self.0.push(None);
        self
    }

    pub fn push(&mut self, value: Option<Value>) {
        self.0.push(value);
    }

    /// The argument at `index`, or `None` when absent or null.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Value>> {
        self.0.iter().map(Option::as_ref)
    }
}

impl FromIterator<Option<Value>> for Arguments {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().map(Some).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Receipt {
        total: u32,
    }

    #[test]
    fn typed_values_carry_their_key() {
        let value = Value::new(42_i64);
        assert_eq!(value.type_key().as_str(), "i64");
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
        assert!(value.downcast_ref::<String>().is_none());
    }

    #[test]
    fn tagged_values_downcast_to_payload() {
        let value = Value::tagged("receipt", Receipt { total: 12 });
        assert_eq!(value.type_key().as_str(), "receipt");
        assert_eq!(value.downcast_ref::<Receipt>().map(|r| r.total), Some(12));
        assert!(format!("{value:?}").contains("total: 12"));
    }

    #[test]
    fn clones_share_payload() {
        let value = Value::from("hi");
        let copy = value.clone();
        assert!(value.ptr_eq(&copy));
        assert!(!value.ptr_eq(&Value::from("hi")));
    }

    #[test]
    fn arguments_keep_nulls_positional() {
        let args = Arguments::new().with("a").with_null().with(3_i64);
        assert_eq!(args.len(), 3);
        assert!(args.get(1).is_none());
        assert_eq!(args.get(2).and_then(|v| v.downcast_ref::<i64>()), Some(&3));
        assert_eq!(args.iter().filter(Option::is_some).count(), 2);
    }
}

//! Type tags and the explicit type hierarchy.
//!
//! Rust has no runtime class hierarchy to walk, so every type that takes part
//! in resolution is named by a [`TypeKey`] and its ancestors are declared in a
//! [`TypeGraph`]. A [`SupertypeStrategy`] turns the graph into an ordered
//! ancestor sequence, which is the only thing that decides dispatch fallback.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A cheap, cloneable tag naming a type (e.g. `"string"`, `"Mail"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    /// A key backed by a static string; usable in `const` contexts.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A Rust type that can travel through resolution as a [`Value`](crate::Value).
pub trait Typed: std::any::Any + fmt::Debug + Send + Sync {
    /// The tag this type is registered and dispatched under.
    fn type_key() -> TypeKey;
}

macro_rules! impl_typed {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_key() -> TypeKey {
                    TypeKey::from_static($name)
                }
            }
        )*
    };
}

impl_typed!(
    String => "string",
    bool => "bool",
    i32 => "i32",
    i64 => "i64",
    u32 => "u32",
    u64 => "u64",
    f64 => "f64",
);

/// The declared parents of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNode {
    /// The concrete parent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<TypeKey>,

    /// Capability/interface parents, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<TypeKey>,
}

/// An explicit parent-link graph between [`TypeKey`]s.
///
/// Declarations that would introduce a cycle are rejected, so every walk over
/// the graph is finite. An optional root type is treated as an ancestor of
/// every other type.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    nodes: HashMap<TypeKey, TypeNode>,
    root: Option<TypeKey>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph whose every type implicitly descends from `root`.
    pub fn with_root(root: impl Into<TypeKey>) -> Self {
        Self {
            nodes: HashMap::new(),
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&TypeKey> {
        self.root.as_ref()
    }

    /// Declare (or redeclare) the parents of `ty`.
    pub fn declare(
        &mut self,
        ty: impl Into<TypeKey>,
        superclass: Option<TypeKey>,
        interfaces: impl IntoIterator<Item = TypeKey>,
    ) -> Result<&mut Self, ConfigError> {
        let ty = ty.into();
        let node = TypeNode {
            superclass,
            interfaces: interfaces.into_iter().collect(),
        };

        for parent in node.superclass.iter().chain(node.interfaces.iter()) {
            if *parent == ty || self.reaches(parent, &ty) {
                return Err(ConfigError::TypeCycle {
                    ty,
                    through: parent.clone(),
                });
            }
        }

        self.nodes.insert(ty, node);
        Ok(self)
    }

    /// Shorthand for a type with only a concrete parent.
    pub fn class(
        &mut self,
        ty: impl Into<TypeKey>,
        superclass: impl Into<TypeKey>,
    ) -> Result<&mut Self, ConfigError> {
        self.declare(ty, Some(superclass.into()), [])
    }

    /// Shorthand for a type with only interface parents.
    pub fn implements(
        &mut self,
        ty: impl Into<TypeKey>,
        interfaces: impl IntoIterator<Item = TypeKey>,
    ) -> Result<&mut Self, ConfigError> {
        self.declare(ty, None, interfaces)
    }

    pub fn node(&self, ty: &TypeKey) -> Option<&TypeNode> {
        self.nodes.get(ty)
    }

    pub fn superclass(&self, ty: &TypeKey) -> Option<&TypeKey> {
        self.nodes.get(ty).and_then(|n| n.superclass.as_ref())
    }

    pub fn interfaces(&self, ty: &TypeKey) -> &[TypeKey] {
        self.nodes
            .get(ty)
            .map(|n| n.interfaces.as_slice())
            .unwrap_or(&[])
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a value of type `sub` may stand where `sup` is expected.
    pub fn is_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        sub == sup || self.root.as_ref() == Some(sup) || self.reaches(sub, sup)
    }

    /// Whether `target` is a declared (transitive) parent of `from`.
    fn reaches(&self, from: &TypeKey, target: &TypeKey) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(node) = self.nodes.get(current) {
                for parent in node.superclass.iter().chain(node.interfaces.iter()) {
                    if parent == target {
                        return true;
                    }
                    stack.push(parent);
                }
            }
        }
        false
    }
}

/// Produces the ancestor search order of a type.
///
/// Implementations must be deterministic and finite, and must not yield the
/// type itself. Different strategies give different (equally valid)
/// resolution outcomes for the same resolver registry.
pub trait SupertypeStrategy: Send + Sync {
    /// Ancestors of `ty`, nearest-first according to this policy.
    fn hierarchy_of<'a>(&'a self, ty: &TypeKey) -> Box<dyn Iterator<Item = TypeKey> + 'a>;

    /// Whether `sub` is `sup` or one of its descendants.
    fn is_subtype(&self, sub: &TypeKey, sup: &TypeKey) -> bool {
        sub == sup || self.hierarchy_of(sub).any(|t| &t == sup)
    }

    /// Narrow a declared type to the runtime type of a value when the
    /// runtime type is safely assignable to it.
    fn narrow(&self, declared: &TypeKey, runtime: &TypeKey) -> TypeKey {
        if self.is_subtype(runtime, declared) {
            runtime.clone()
        } else {
            declared.clone()
        }
    }
}

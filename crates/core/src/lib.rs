//! # Missive Core
//!
//! Domain types, traits, and error definitions for the Missive message
//! contract engine. This crate has **no engine logic**: it defines the model
//! (type tags, values, weighted registries, descriptors) and the collaborator
//! traits every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every pluggable step of an invocation is a trait here. Implementations live
//! in `missive-engine` and `missive-standard`. This enables:
//! - Swapping resolvers, composers and senders per configuration
//! - Easy testing with closures or stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod method;
pub mod types;
pub mod value;
pub mod variable;
pub mod viewer;
pub mod weighted;

// Re-export key types at crate root for ergonomics
pub use error::{BoxError, ConfigError, Error, MissingTemplate, Result, ViewerNotFound};
pub use message::{Composer, Sender, TemplateSource};
pub use method::{BoundMethod, ContractDescriptor, MethodDescriptor, ParamDescriptor, Returns, TemplateArgument};
pub use types::{SupertypeStrategy, TypeGraph, TypeKey, TypeNode, Typed};
pub use value::{Arguments, Payload, Value};
pub use variable::{
    Continuation, FrozenResolverRegistry, ReplacementMap, ResolutionOutcome, ResolutionRequest,
    ResolveContext, ResolverRegistry, Variable, VariableResolution, VariableResolver,
};
pub use viewer::{Invocation, LocatorResolver, ViewerLocator};
pub use weighted::{FrozenRegistry, FrozenTypedRegistry, TypedRegistry, Weighted, WeightedRegistry};

//! Standard collaborators for Missive.
//!
//! Everything the engine treats as pluggable has a ready-made version here:
//! a `%name%` string composer, in-memory template catalogs, downcasting
//! variable resolvers, viewer locators and senders.

pub mod catalog;
pub mod composer;
pub mod locator;
pub mod resolvers;
pub mod sender;

pub use catalog::Catalog;
pub use composer::{DEFAULT_PREFIX, DEFAULT_SUFFIX, StringComposer};
pub use locator::{FixedViewerLocator, MarkedParameterLocator, VIEWER_MARKER};
pub use resolvers::{display_resolver, identity_resolver, typed_resolver};
pub use sender::{CollectingSender, TracingSender};

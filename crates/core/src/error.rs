//! Error types for the missive domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Configuration problems, per-call failures and collaborator failures each
//! have their own shape so callers can tell a broken setup from a broken call.

use thiserror::Error;

use crate::types::TypeKey;

/// Boxed error produced by a user-supplied collaborator (resolver, sender, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The top-level error type for all missive operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // --- Per-call errors ---
    #[error("No viewer found for {contract}::{method}: {source}")]
    ViewerNotFound {
        contract: TypeKey,
        method: String,
        #[source]
        source: ViewerNotFound,
    },

    #[error("No template for {contract}::{method}: {source}")]
    MissingTemplate {
        contract: TypeKey,
        method: String,
        #[source]
        source: MissingTemplate,
    },

    #[error("The placeholder {placeholder} was unfinished in method {contract}::{method} (value: {value})")]
    Unresolved {
        contract: TypeKey,
        method: String,
        placeholder: String,
        value: String,
    },

    #[error("A method was not mapped: {contract}::{method}")]
    UnmappedMethod { contract: TypeKey, method: String },

    #[error("Resolution of {contract}::{method} exceeded {limit} steps")]
    ResolutionLimit {
        contract: TypeKey,
        method: String,
        limit: usize,
    },

    // --- Collaborator errors, surfaced unmodified ---
    #[error(transparent)]
    Collaborator(BoxError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error raised by a collaborator.
    pub fn collaborator(err: impl Into<BoxError>) -> Self {
        Error::Collaborator(err.into())
    }

    /// Whether this error was detected while building a configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

// --- Bounded context errors ---

/// Raised while assembling or freezing a configuration. No instance escapes
/// construction when one of these occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Given method does not have a message key: {contract}::{method}")]
    MissingMessageKey { contract: TypeKey, method: String },

    #[error("No viewer locator accepted method {contract}::{method}")]
    NoViewerLocator { contract: TypeKey, method: String },

    #[error("Missing required component: {0}")]
    MissingComponent(&'static str),

    #[error("The same entry was registered twice with priority {priority}")]
    DuplicateEntry { priority: i32 },

    #[error("Method {method} is declared more than once in {contract}")]
    DuplicateMethod { contract: TypeKey, method: String },

    #[error("Default method {contract}::{method} has no registered body")]
    MissingDefaultBody { contract: TypeKey, method: String },

    #[error("A body was registered for {contract}::{method}, which is not a default method")]
    UnknownDefaultBody { contract: TypeKey, method: String },

    #[error("Declaring {ty} would create a cycle through {through}")]
    TypeCycle { ty: TypeKey, through: TypeKey },
}

/// A viewer could not be located for an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ViewerNotFound {
    pub reason: String,
}

impl ViewerNotFound {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A template source has no template for a message key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing template for key '{key}'")]
pub struct MissingTemplate {
    pub key: String,
}

impl MissingTemplate {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

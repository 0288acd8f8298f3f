//! Contract scanning — binds every templated method once, at freeze time.
//!
//! A method is templated unless it has a default body or returns the
//! configuration. Each templated method needs a message key and exactly one
//! viewer locator, taken from the first locator resolver (highest priority
//! first) that accepts it. Any failure aborts the freeze.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use missive_core::{
    BoundMethod, ConfigError, ContractDescriptor, FrozenRegistry, LocatorResolver, MethodDescriptor,
    Returns, TypeKey,
};

/// Bound methods of one contract, in declaration order.
pub type BoundMethods<V> = IndexMap<String, BoundMethod<V>>;

/// Validate `contract` and bind all of its templated methods.
///
/// `bodies` names the methods that have a registered default body.
pub fn scan_contract<'a, V>(
    contract: &ContractDescriptor,
    locators: &FrozenRegistry<dyn LocatorResolver<V>>,
    bodies: impl IntoIterator<Item = &'a str>,
) -> Result<BoundMethods<V>, ConfigError> {
    check_unique_names(contract)?;
    check_default_bodies(contract, bodies)?;

    let mut bound = IndexMap::with_capacity(contract.methods.len());
    for method in contract.methods.iter().filter(|m| m.is_templated()) {
        let binding = bind_method(&contract.name, method, locators)?;
        bound.insert(method.name.clone(), binding);
    }
    Ok(bound)
}

/// Bind a single templated method to its message key and viewer locator.
pub fn bind_method<V>(
    contract: &TypeKey,
    method: &MethodDescriptor,
    locators: &FrozenRegistry<dyn LocatorResolver<V>>,
) -> Result<BoundMethod<V>, ConfigError> {
    let message_key = method
        .message_key
        .clone()
        .ok_or_else(|| ConfigError::MissingMessageKey {
            contract: contract.clone(),
            method: method.name.clone(),
        })?;

    for entry in locators.entries_descending() {
        if let Some(locator) = entry.value().resolve(method, contract) {
            debug!(
                contract = %contract,
                method = %method.name,
                key = %message_key,
                locator_priority = entry.priority(),
                "Bound method"
            );
            return Ok(BoundMethod {
                descriptor: method.clone(),
                message_key,
                locator,
                locator_priority: entry.priority(),
            });
        }
    }

    Err(ConfigError::NoViewerLocator {
        contract: contract.clone(),
        method: method.name.clone(),
    })
}

// ── Internal ──────────────────────────────────────────────

fn check_unique_names(contract: &ContractDescriptor) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for method in &contract.methods {
        if !names.insert(method.name.as_str()) {
            return Err(ConfigError::DuplicateMethod {
                contract: contract.name.clone(),
                method: method.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_default_bodies<'a>(
    contract: &ContractDescriptor,
    bodies: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let bodies: HashSet<&str> = bodies.into_iter().collect();

    for name in &bodies {
        let declared_default = contract.find(name).is_some_and(|m| m.default_body);
        if !declared_default {
            return Err(ConfigError::UnknownDefaultBody {
                contract: contract.name.clone(),
                method: (*name).to_string(),
            });
        }
    }

    // A default method returning the configuration never runs its body.
    let missing = contract.methods.iter().find(|m| {
        m.default_body && m.returns != Returns::Configuration && !bodies.contains(m.name.as_str())
    });
    match missing {
        Some(method) => Err(ConfigError::MissingDefaultBody {
            contract: contract.name.clone(),
            method: method.name.clone(),
        }),
        None => Ok(()),
    }
}

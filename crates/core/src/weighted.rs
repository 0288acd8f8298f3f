//! Priority-ordered registries.
//!
//! A [`WeightedRegistry`] is the mutable, configuration-time form; freezing it
//! yields a [`FrozenRegistry`] that is read-only and cheap to share across
//! threads. Entries are ordered highest priority first, ties by insertion.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::types::TypeKey;

/// One `(priority, value)` entry.
///
/// The insertion sequence breaks priority ties, so two distinct entries never
/// compare equal.
#[derive(Debug)]
pub struct Weighted<T: ?Sized> {
    priority: i32,
    sequence: u64,
    value: Arc<T>,
}

impl<T: ?Sized> Weighted<T> {
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }
}

impl<T: ?Sized> Clone for Weighted<T> {
    fn clone(&self) -> Self {
        Self {
            priority: self.priority,
            sequence: self.sequence,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T: ?Sized> PartialEq for Weighted<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: ?Sized> Eq for Weighted<T> {}

impl<T: ?Sized> PartialOrd for Weighted<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for Weighted<T> {
    /// Higher priority sorts first; equal priorities keep insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// A mutable, priority-ordered collection used while configuring.
#[derive(Debug)]
pub struct WeightedRegistry<T: ?Sized> {
    entries: Vec<Weighted<T>>,
    next_sequence: u64,
}

impl<T: ?Sized> Default for WeightedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 0,
        }
    }
}

impl<T: ?Sized> WeightedRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` with `priority`.
    ///
    /// Registering the very same value (by identity) twice at one priority is
    /// rejected instead of silently collapsing into one entry.
    pub fn insert(&mut self, priority: i32, value: Arc<T>) -> Result<(), ConfigError> {
        let duplicate = self
            .entries
            .iter()
            .any(|e| e.priority == priority && same_identity(&e.value, &value));
        if duplicate {
            return Err(ConfigError::DuplicateEntry { priority });
        }

        let entry = Weighted {
            priority,
            sequence: self.next_sequence,
            value,
        };
        self.next_sequence += 1;

        let at = self.entries.partition_point(|e| e < &entry);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Entries highest-priority first. Restartable: each call starts over.
    pub fn entries_descending(&self) -> impl Iterator<Item = &Weighted<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy into a read-only view.
    pub fn freeze(self) -> FrozenRegistry<T> {
        FrozenRegistry {
            entries: self.entries.into(),
        }
    }
}

/// The read-only form of a [`WeightedRegistry`].
#[derive(Debug)]
pub struct FrozenRegistry<T: ?Sized> {
    entries: Arc<[Weighted<T>]>,
}

impl<T: ?Sized> Clone for FrozenRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T: ?Sized> Default for FrozenRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
        }
    }
}

impl<T: ?Sized> FrozenRegistry<T> {
    pub fn entries_descending(&self) -> impl Iterator<Item = &Weighted<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-type weighted registries, keyed by declared type.
#[derive(Debug)]
pub struct TypedRegistry<T: ?Sized> {
    by_type: HashMap<TypeKey, WeightedRegistry<T>>,
}

impl<T: ?Sized> Default for TypedRegistry<T> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
        }
    }
}

impl<T: ?Sized> TypedRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: TypeKey, priority: i32, value: Arc<T>) -> Result<(), ConfigError> {
        self.by_type.entry(ty).or_default().insert(priority, value)
    }

    /// Total number of entries across every type.
    pub fn len(&self) -> usize {
        self.by_type.values().map(WeightedRegistry::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(self) -> FrozenTypedRegistry<T> {
        FrozenTypedRegistry {
            by_type: Arc::new(
                self.by_type
                    .into_iter()
                    .map(|(ty, registry)| (ty, registry.freeze()))
                    .collect(),
            ),
        }
    }
}

/// The read-only form of a [`TypedRegistry`].
#[derive(Debug)]
pub struct FrozenTypedRegistry<T: ?Sized> {
    by_type: Arc<HashMap<TypeKey, FrozenRegistry<T>>>,
}

impl<T: ?Sized> Clone for FrozenTypedRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            by_type: Arc::clone(&self.by_type),
        }
    }
}

impl<T: ?Sized> Default for FrozenTypedRegistry<T> {
    fn default() -> Self {
        Self {
            by_type: Arc::new(HashMap::new()),
        }
    }
}

impl<T: ?Sized> FrozenTypedRegistry<T> {
    /// Entries for exactly `ty`, highest priority first; empty when none.
    pub fn entries_for(&self, ty: &TypeKey) -> impl Iterator<Item = &Weighted<T>> {
        self.by_type
            .get(ty)
            .into_iter()
            .flat_map(FrozenRegistry::entries_descending)
    }

    /// Types that have at least one entry, sorted by name.
    pub fn types(&self) -> Vec<&TypeKey> {
        let mut types: Vec<_> = self.by_type.keys().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(FrozenRegistry::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn same_identity<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(registry: &WeightedRegistry<str>) -> Vec<String> {
        registry
            .entries_descending()
            .map(|e| e.value().to_string())
            .collect()
    }

    #[test]
    fn entries_are_highest_priority_first() {
        let mut registry: WeightedRegistry<str> = WeightedRegistry::new();
        registry.insert(1, Arc::from("low")).unwrap();
        registry.insert(10, Arc::from("high")).unwrap();
        registry.insert(-5, Arc::from("lowest")).unwrap();
        registry.insert(i32::MAX, Arc::from("max")).unwrap();

        assert_eq!(names(&registry), ["max", "high", "low", "lowest"]);
    }

    #[test]
    fn ties_keep_both_entries_in_insertion_order() {
        let mut registry: WeightedRegistry<str> = WeightedRegistry::new();
        registry.insert(5, Arc::from("first")).unwrap();
        registry.insert(5, Arc::from("second")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(names(&registry), ["first", "second"]);
    }

    #[test]
    fn same_value_twice_at_same_priority_is_rejected() {
        let mut registry: WeightedRegistry<str> = WeightedRegistry::new();
        let value: Arc<str> = Arc::from("only");
        registry.insert(3, Arc::clone(&value)).unwrap();

        let err = registry.insert(3, Arc::clone(&value)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateEntry { priority: 3 });
        assert_eq!(registry.len(), 1);

        // A different priority is a distinct entry.
        registry.insert(4, value).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn iteration_is_restartable() {
        let mut registry: WeightedRegistry<str> = WeightedRegistry::new();
        registry.insert(0, Arc::from("a")).unwrap();
        registry.insert(0, Arc::from("b")).unwrap();
        let frozen = registry.freeze();

        let first: Vec<_> = frozen.entries_descending().map(|e| e.sequence()).collect();
        let second: Vec<_> = frozen.entries_descending().map(|e| e.sequence()).collect();
        assert_eq!(first, second);
        assert_eq!(frozen.len(), 2);
    }

    #[test]
    fn typed_registry_lookup_of_unknown_type_is_empty() {
        let mut registry: TypedRegistry<str> = TypedRegistry::new();
        registry
            .insert(TypeKey::from_static("string"), 0, Arc::from("s"))
            .unwrap();
        let frozen = registry.freeze();

        assert_eq!(frozen.entries_for(&TypeKey::from_static("string")).count(), 1);
        assert_eq!(frozen.entries_for(&TypeKey::from_static("mail")).count(), 0);
        assert_eq!(frozen.types(), [&TypeKey::from_static("string")]);
    }

    #[test]
    fn weighted_ordering_is_total() {
        let mut registry: WeightedRegistry<str> = WeightedRegistry::new();
        registry.insert(1, Arc::from("a")).unwrap();
        registry.insert(1, Arc::from("b")).unwrap();
        let entries: Vec<_> = registry.entries_descending().collect();
        assert_ne!(entries[0], entries[1]);
        assert!(entries[0] < entries[1]);
    }
}

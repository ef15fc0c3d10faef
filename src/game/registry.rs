//! Name-indexed entity registries, one lock each.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{WorldError, WorldResult};
use crate::game::entity::Named;

/// Registry contents: entities keyed by their unique name.
pub type EntityMap<T> = HashMap<String, T>;

/// A concurrent map of named entities.
#[derive(Debug)]
pub struct Registry<T> {
    /// Lock label used in poisoning errors.
    label: &'static str,
    entries: RwLock<EntityMap<T>>,
}

impl<T: Named + Clone> Registry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: RwLock::new(EntityMap::new()),
        }
    }

    /// Create a registry pre-filled with `entries`.
    #[must_use]
    pub fn with_entries(label: &'static str, entries: EntityMap<T>) -> Self {
        Self {
            label,
            entries: RwLock::new(entries),
        }
    }

    /// Acquire the read lock.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if a writer panicked.
    pub fn read(&self) -> WorldResult<RwLockReadGuard<'_, EntityMap<T>>> {
        self.entries
            .read()
            .map_err(|_| WorldError::LockPoisoned(self.label))
    }

    /// Acquire the write lock.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if a writer panicked.
    pub fn write(&self) -> WorldResult<RwLockWriteGuard<'_, EntityMap<T>>> {
        self.entries
            .write()
            .map_err(|_| WorldError::LockPoisoned(self.label))
    }

    /// Insert a new entity.
    ///
    /// # Errors
    ///
    /// [`WorldError::DuplicateName`] if the name is taken.
    pub fn add(&self, entity: T) -> WorldResult<()> {
        let mut entries = self.write()?;
        if entries.contains_key(entity.name()) {
            return Err(WorldError::DuplicateName(entity.name().to_string()));
        }
        entries.insert(entity.name().to_string(), entity);
        Ok(())
    }

    /// Snapshot of one entity.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn get_by_name(&self, name: &str) -> WorldResult<Option<T>> {
        Ok(self.read()?.get(name).cloned())
    }

    /// Snapshot of every entity, sorted by name.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn get_all(&self) -> WorldResult<Vec<T>> {
        let mut all: Vec<T> = self.read()?.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    /// Whether `name` is registered.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn contains(&self, name: &str) -> WorldResult<bool> {
        Ok(self.read()?.contains_key(name))
    }

    /// Number of entities.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn len(&self) -> WorldResult<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the registry is empty.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn is_empty(&self) -> WorldResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Sorted names of entities satisfying `predicate`.
    ///
    /// # Errors
    ///
    /// [`WorldError::LockPoisoned`] if the lock is poisoned.
    pub fn names_where(&self, predicate: impl Fn(&T) -> bool) -> WorldResult<Vec<String>> {
        let mut names: Vec<String> = self
            .read()?
            .values()
            .filter(|entity| predicate(entity))
            .map(|entity| entity.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{MapStructure, Team};
    use crate::geometry::Vector2D;

    #[test]
    fn test_add_and_lookup() {
        let registry = Registry::new("structures");
        assert!(registry.is_empty().unwrap());
        registry
            .add(MapStructure::gate("gate_b1", Team::Blue, Vector2D::new(6, 5)))
            .unwrap();
        assert!(registry.contains("gate_b1").unwrap());
        assert!(!registry.contains("gate_r1").unwrap());
        assert_eq!(registry.len().unwrap(), 1);
        let gate = registry.get_by_name("gate_b1").unwrap().unwrap();
        assert_eq!(gate.team, Some(Team::Blue));
        assert!(registry.get_by_name("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = Registry::new("structures");
        registry.add(MapStructure::wall("w", Vector2D::new(0, 0))).unwrap();
        let err = registry
            .add(MapStructure::wall("w", Vector2D::new(1, 0)))
            .unwrap_err();
        assert!(matches!(err, WorldError::DuplicateName(name) if name == "w"));
    }

    #[test]
    fn test_get_all_sorted() {
        let registry = Registry::new("structures");
        for name in ["c", "a", "b"] {
            registry.add(MapStructure::wall(name, Vector2D::new(0, 0))).unwrap();
        }
        let names: Vec<_> = registry.get_all().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let picked = registry.names_where(|s| s.name != "b").unwrap();
        assert_eq!(picked, vec!["a", "c"]);
    }
}

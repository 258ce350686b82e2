//! # Gadget Store
//!
//! Storage abstraction for gadget records.
//!
//! ## Invariants
//! - Names are unique across all stored gadgets; `insert` and `modify`
//!   enforce this themselves, not only the callers
//! - `modify` is atomic: the change closure runs against the current record
//!   and its result is written back without interleaving other writers

use std::sync::RwLock;

use uuid::Uuid;

use super::errors::{GadgetError, GadgetResult};
use super::model::{Gadget, GadgetStatus};

/// A read-modify-write step applied inside [`GadgetStore::modify`]
pub type GadgetChange<'a> = &'a mut dyn FnMut(&mut Gadget) -> GadgetResult<()>;

/// Gadget repository trait
pub trait GadgetStore: Send + Sync {
    /// Insert a new gadget. Fails with `NameTaken` if the name is in use.
    fn insert(&self, gadget: &Gadget) -> GadgetResult<()>;

    /// Find a gadget by its ID
    fn find_by_id(&self, id: Uuid) -> GadgetResult<Option<Gadget>>;

    /// All gadgets in creation order, optionally with an exact status
    fn list(&self, status: Option<GadgetStatus>) -> GadgetResult<Vec<Gadget>>;

    /// Atomically apply `change` to the gadget with `id` and persist it.
    ///
    /// Nothing is written if `change` fails. Fails with `NotFound` for an
    /// unknown id and `NameTaken` if the change renames onto an existing name.
    fn modify(&self, id: Uuid, change: GadgetChange<'_>) -> GadgetResult<Gadget>;
}

/// In-memory gadget store
#[derive(Debug, Default)]
pub struct InMemoryGadgetStore {
    gadgets: RwLock<Vec<Gadget>>,
}

impl InMemoryGadgetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> GadgetError {
    GadgetError::Storage("Lock poisoned".to_string())
}

impl GadgetStore for InMemoryGadgetStore {
    fn insert(&self, gadget: &Gadget) -> GadgetResult<()> {
        let mut gadgets = self.gadgets.write().map_err(poisoned)?;

        if gadgets.iter().any(|g| g.name == gadget.name) {
            return Err(GadgetError::NameTaken(gadget.name.clone()));
        }

        gadgets.push(gadget.clone());
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> GadgetResult<Option<Gadget>> {
        let gadgets = self.gadgets.read().map_err(poisoned)?;
        Ok(gadgets.iter().find(|g| g.id == id).cloned())
    }

    fn list(&self, status: Option<GadgetStatus>) -> GadgetResult<Vec<Gadget>> {
        let gadgets = self.gadgets.read().map_err(poisoned)?;
        Ok(gadgets
            .iter()
            .filter(|g| status.map_or(true, |s| g.status == s))
            .cloned()
            .collect())
    }

    fn modify(&self, id: Uuid, change: GadgetChange<'_>) -> GadgetResult<Gadget> {
        let mut gadgets = self.gadgets.write().map_err(poisoned)?;

        let index = gadgets
            .iter()
            .position(|g| g.id == id)
            .ok_or(GadgetError::NotFound(id))?;

        let mut updated = gadgets[index].clone();
        change(&mut updated)?;

        if updated.name != gadgets[index].name
            && gadgets.iter().any(|g| g.id != id && g.name == updated.name)
        {
            return Err(GadgetError::NameTaken(updated.name));
        }

        gadgets[index] = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn gadget(name: &str, status: GadgetStatus) -> Gadget {
        Gadget::new(name.to_string(), status, 50.0, Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_insert_rejects_duplicate_name() {
        let store = InMemoryGadgetStore::new();
        store.insert(&gadget("Echo Raven", GadgetStatus::Available)).unwrap();

        let result = store.insert(&gadget("Echo Raven", GadgetStatus::Deployed));
        assert!(matches!(result, Err(GadgetError::NameTaken(n)) if n == "Echo Raven"));
        assert_eq!(store.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_filters_by_exact_status() {
        let store = InMemoryGadgetStore::new();
        store.insert(&gadget("Echo Raven", GadgetStatus::Available)).unwrap();
        store.insert(&gadget("Nova Wolf", GadgetStatus::Deployed)).unwrap();
        store.insert(&gadget("Dark Fang", GadgetStatus::Deployed)).unwrap();

        let deployed = store.list(Some(GadgetStatus::Deployed)).unwrap();
        assert_eq!(deployed.len(), 2);
        assert!(deployed.iter().all(|g| g.status == GadgetStatus::Deployed));

        let names: Vec<_> = store.list(None).unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Echo Raven", "Nova Wolf", "Dark Fang"]);
    }

    #[test]
    fn test_modify_unknown_id() {
        let store = InMemoryGadgetStore::new();
        let result = store.modify(Uuid::new_v4(), &mut |_| Ok(()));
        assert!(matches!(result, Err(GadgetError::NotFound(_))));
    }

    #[test]
    fn test_failed_change_writes_nothing() {
        let store = InMemoryGadgetStore::new();
        let g = gadget("Echo Raven", GadgetStatus::Available);
        store.insert(&g).unwrap();

        let result = store.modify(g.id, &mut |g| {
            g.status = GadgetStatus::Deployed;
            Err(GadgetError::AlreadyDestroyed)
        });
        assert!(result.is_err());
        assert_eq!(
            store.find_by_id(g.id).unwrap().unwrap().status,
            GadgetStatus::Available
        );
    }

    #[test]
    fn test_modify_rejects_rename_onto_existing_name() {
        let store = InMemoryGadgetStore::new();
        let first = gadget("Echo Raven", GadgetStatus::Available);
        let second = gadget("Nova Wolf", GadgetStatus::Available);
        store.insert(&first).unwrap();
        store.insert(&second).unwrap();

        let result = store.modify(second.id, &mut |g| {
            g.name = "Echo Raven".to_string();
            Ok(())
        });
        assert!(matches!(result, Err(GadgetError::NameTaken(_))));
        assert_eq!(store.find_by_id(second.id).unwrap().unwrap().name, "Nova Wolf");

        // Renaming to its own name is not a collision
        store
            .modify(first.id, &mut |g| {
                g.name = "Echo Raven".to_string();
                Ok(())
            })
            .unwrap();
    }
}

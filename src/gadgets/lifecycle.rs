//! # Gadget Lifecycle
//!
//! Create, list, update, decommission and self-destruct operations on top
//! of an injected [`GadgetStore`].

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::codename::{draw_success_probability, CodenameGenerator};
use super::errors::{GadgetError, GadgetResult};
use super::model::{Gadget, GadgetPatch, GadgetStatus};
use super::store::GadgetStore;

/// Upper bound on codename draws per create
pub const MAX_CODENAME_ATTEMPTS: usize = 64;

/// Gadget lifecycle service
#[derive(Clone)]
pub struct GadgetService {
    store: Arc<dyn GadgetStore>,
    generator: CodenameGenerator,
}

impl GadgetService {
    pub fn new(store: Arc<dyn GadgetStore>) -> Self {
        Self::with_generator(store, CodenameGenerator::default())
    }

    pub fn with_generator(store: Arc<dyn GadgetStore>, generator: CodenameGenerator) -> Self {
        Self { store, generator }
    }

    /// Create a gadget owned by `owner` with a fresh unique codename.
    ///
    /// The status defaults to `available`; `decommissioned` is rejected.
    /// Uniqueness is decided by the store at insert time, so concurrent
    /// creates that draw the same name retry instead of both succeeding.
    pub fn create(&self, status: Option<GadgetStatus>, owner: Uuid) -> GadgetResult<Gadget> {
        let status = match status {
            Some(s) if !s.is_creatable() => return Err(GadgetError::InvalidStatus(s.to_string())),
            Some(s) => s,
            None => GadgetStatus::Available,
        };

        let mut rng = rand::thread_rng();
        let success_probability = draw_success_probability(&mut rng);

        for attempt in 1..=MAX_CODENAME_ATTEMPTS {
            let name = self.generator.generate_with(&mut rng);
            let gadget = Gadget::new(name, status, success_probability, owner, Utc::now());

            match self.store.insert(&gadget) {
                Ok(()) => {
                    info!(
                        gadget_id = %gadget.id,
                        name = %gadget.name,
                        status = %gadget.status,
                        owner = %owner,
                        attempt,
                        "gadget created"
                    );
                    return Ok(gadget);
                }
                Err(GadgetError::NameTaken(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        warn!(attempts = MAX_CODENAME_ATTEMPTS, "codename space exhausted");
        Err(GadgetError::CodenameExhausted {
            attempts: MAX_CODENAME_ATTEMPTS,
        })
    }

    /// List gadgets, optionally restricted to one status
    pub fn list(&self, status: Option<GadgetStatus>) -> GadgetResult<Vec<Gadget>> {
        self.store.list(status)
    }

    pub fn get(&self, id: Uuid) -> GadgetResult<Gadget> {
        self.store.find_by_id(id)?.ok_or(GadgetError::NotFound(id))
    }

    /// Apply a partial update
    pub fn update(&self, id: Uuid, patch: GadgetPatch) -> GadgetResult<Gadget> {
        patch.validate()?;
        let gadget = self
            .store
            .modify(id, &mut |g| g.apply_patch(&patch, Utc::now()))?;
        info!(gadget_id = %id, status = %gadget.status, "gadget updated");
        Ok(gadget)
    }

    /// Mark a gadget decommissioned
    pub fn decommission(&self, id: Uuid) -> GadgetResult<Gadget> {
        let gadget = self.store.modify(id, &mut |g| g.decommission(Utc::now()))?;
        info!(gadget_id = %id, name = %gadget.name, "gadget decommissioned");
        Ok(gadget)
    }

    /// Mark a gadget destroyed
    pub fn self_destruct(&self, id: Uuid) -> GadgetResult<Gadget> {
        let gadget = self.store.modify(id, &mut |g| g.self_destruct(Utc::now()))?;
        info!(gadget_id = %id, name = %gadget.name, "gadget self-destructed");
        Ok(gadget)
    }
}

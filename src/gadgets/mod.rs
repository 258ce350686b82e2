//! # Gadgets Module
//!
//! Gadget records, codename generation, the status lifecycle and the
//! storage abstraction it runs on.

pub mod codename;
pub mod errors;
pub mod lifecycle;
pub mod model;
pub mod store;

pub use codename::CodenameGenerator;
pub use errors::{GadgetError, GadgetResult};
pub use lifecycle::{GadgetService, MAX_CODENAME_ATTEMPTS};
pub use model::{Gadget, GadgetPatch, GadgetStatus};
pub use store::{GadgetStore, InMemoryGadgetStore};

//! # Gadget Errors
//!
//! Error types for the gadget lifecycle and gadget stores.

use thiserror::Error;
use uuid::Uuid;

use super::model::GadgetStatus;
use crate::validation::FieldError;

/// Result type for gadget operations
pub type GadgetResult<T> = Result<T, GadgetError>;

/// Gadget lifecycle and storage errors
#[derive(Debug, Clone, Error)]
pub enum GadgetError {
    // ==================
    // Input Errors
    // ==================

    /// Status value outside the accepted set for the operation
    #[error("Invalid status: '{0}'")]
    InvalidStatus(String),

    /// Malformed patch fields
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    // ==================
    // Lifecycle Errors
    // ==================

    /// No gadget with this id
    #[error("Gadget not found")]
    NotFound(Uuid),

    /// The requested status change is not an allowed edge
    #[error("Gadget cannot move from '{from}' to '{to}'")]
    InvalidTransition { from: GadgetStatus, to: String },

    #[error("Gadget already decommissioned")]
    AlreadyDecommissioned,

    #[error("Gadget already destroyed")]
    AlreadyDestroyed,

    /// Another gadget already carries this name
    #[error("Gadget name already taken: '{0}'")]
    NameTaken(String),

    // ==================
    // Internal Errors
    // ==================

    /// No unused codename found within the retry bound
    #[error("Internal error: no unused codename after {attempts} attempts")]
    CodenameExhausted { attempts: usize },

    /// Codename word lists cannot produce a valid name
    #[error("Invalid codename word lists: {0}")]
    InvalidWordLists(&'static str),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),
}

impl GadgetError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GadgetError::InvalidStatus(_)
            | GadgetError::Validation(_)
            | GadgetError::InvalidTransition { .. }
            | GadgetError::AlreadyDecommissioned
            | GadgetError::AlreadyDestroyed
            | GadgetError::NameTaken(_) => 400,

            GadgetError::NotFound(_) => 404,

            GadgetError::CodenameExhausted { .. }
            | GadgetError::InvalidWordLists(_)
            | GadgetError::Storage(_) => 500,
        }
    }

    /// Returns whether this error was caused by the caller
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

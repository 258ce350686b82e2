//! # Auth Errors
//!
//! Error types for the authentication module.

use thiserror::Error;

use crate::validation::FieldError;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Credential Errors
    // ==================

    /// Signup or signin body failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Email already registered
    #[error("Email already exists")]
    EmailAlreadyExists,

    /// Signin with an email nobody registered
    #[error("No user with provided email")]
    UnknownEmail,

    /// Signin with a wrong password
    #[error("Wrong password")]
    WrongPassword,

    // ==================
    // Token Errors
    // ==================

    /// No session token on the request
    #[error("Access denied: no authentication token provided, please sign in")]
    MissingToken,

    /// Token could not be decoded
    #[error("Invalid token: unable to verify user identity, please sign in again")]
    MalformedToken,

    /// Token has expired
    #[error("Session expired: please sign in again")]
    TokenExpired,

    /// Token signature does not match
    #[error("Invalid token: your session may have been tampered with, please sign in again")]
    InvalidSignature,

    /// Token refers to a user that no longer exists
    #[error("Authentication failed: user does not exist")]
    UserNotFound,

    // ==================
    // Internal Errors
    // ==================

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AuthError::Validation(_) => 400,
            AuthError::EmailAlreadyExists => 400,
            AuthError::UnknownEmail => 400,
            AuthError::WrongPassword => 400,

            // 401 Unauthorized
            AuthError::MissingToken => 401,
            AuthError::MalformedToken => 401,
            AuthError::TokenExpired => 401,
            AuthError::InvalidSignature => 401,
            AuthError::UserNotFound => 401,

            // 500 Internal Server Error
            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

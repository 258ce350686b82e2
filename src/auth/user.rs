//! # User Management
//!
//! User model, request validation and repository for authentication.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::{hash_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use crate::validation::FieldErrors;

/// Longest accepted display name
pub const MAX_NAME_LENGTH: usize = 50;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// User's email address (unique, lowercase)
    pub email: String,

    /// Argon2id password hash (never plaintext)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user from a validated signup request
    pub fn new(request: &SignupRequest) -> AuthResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: hash_password(&request.password)?,
            created_at: Utc::now(),
        })
    }

    /// Verify a password against this user's stored hash
    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }
}

/// The authenticated identity attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    errors.check(
        !email_pattern().is_match(email),
        "email",
        "Invalid email format, please enter a valid email",
    );
}

/// User creation request
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignupRequest {
    /// Trim and lowercase the fields, then validate all of them
    pub fn normalize(self, policy: &PasswordPolicy) -> AuthResult<Self> {
        let request = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.trim().to_string(),
        };

        let mut errors = FieldErrors::new();
        errors.check(request.name.is_empty(), "name", "Name is required");
        errors.check(
            request.name.chars().count() > MAX_NAME_LENGTH,
            "name",
            "Name cannot exceed 50 characters",
        );
        check_email(&request.email, &mut errors);
        policy.check(&request.password, &mut errors);
        errors.finish().map_err(AuthError::Validation)?;

        Ok(request)
    }
}

/// User signin request
#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SigninRequest {
    /// Trim and lowercase the fields, then validate them
    pub fn normalize(self, policy: &PasswordPolicy) -> AuthResult<Self> {
        let request = Self {
            email: self.email.trim().to_lowercase(),
            password: self.password.trim().to_string(),
        };

        let mut errors = FieldErrors::new();
        check_email(&request.email, &mut errors);
        policy.check(&request.password, &mut errors);
        errors.finish().map_err(AuthError::Validation)?;

        Ok(request)
    }
}

/// User repository trait
///
/// Abstracts storage operations for users.
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Find a user by their email
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Check if an email is already registered
    fn email_exists(&self, email: &str) -> AuthResult<bool>;

    /// Create a new user. Fails with `EmailAlreadyExists` on a duplicate.
    fn create(&self, user: &User) -> AuthResult<()>;
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: std::sync::RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    fn email_exists(&self, email: &str) -> AuthResult<bool> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(users.iter().any(|u| u.email == email))
    }

    fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;

        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::EmailAlreadyExists);
        }

        users.push(user.clone());
        Ok(())
    }
}

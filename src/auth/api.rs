//! # Auth Service
//!
//! Signup, signin and token-to-principal resolution on top of an injected
//! [`UserRepository`].

use std::sync::Arc;

use tracing::{info, warn};

use super::crypto::PasswordPolicy;
use super::errors::{AuthError, AuthResult};
use super::jwt::{IssuedToken, JwtConfig, JwtManager};
use super::user::{Principal, SigninRequest, SignupRequest, User, UserRepository};

/// Auth service combining all auth components
#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_manager: JwtManager,
    password_policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_config: JwtConfig,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            user_repo,
            jwt_manager: JwtManager::new(jwt_config),
            password_policy,
        }
    }

    /// Register a new user and issue a session token
    pub fn signup(&self, request: SignupRequest) -> AuthResult<(User, IssuedToken)> {
        let request = request.normalize(&self.password_policy)?;

        // Check if email already exists
        if self.user_repo.email_exists(&request.email)? {
            return Err(AuthError::EmailAlreadyExists);
        }

        // The repository re-checks the email under its own lock/constraint
        let user = User::new(&request)?;
        self.user_repo.create(&user)?;

        let token = self.jwt_manager.issue(user.id)?;
        info!(user_id = %user.id, "user signed up");

        Ok((user, token))
    }

    /// Authenticate a user by email and password
    pub fn signin(&self, request: SigninRequest) -> AuthResult<(User, IssuedToken)> {
        let request = request.normalize(&self.password_policy)?;

        let user = self
            .user_repo
            .find_by_email(&request.email)?
            .ok_or(AuthError::UnknownEmail)?;

        if !user.verify_password(&request.password)? {
            warn!(user_id = %user.id, "signin rejected: wrong password");
            return Err(AuthError::WrongPassword);
        }

        let token = self.jwt_manager.issue(user.id)?;
        info!(user_id = %user.id, "user signed in");

        Ok((user, token))
    }

    /// Resolve a session token to the principal it was issued for
    pub fn authenticate(&self, token: Option<&str>) -> AuthResult<Principal> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let claims = self.jwt_manager.validate_token(token)?;
        let user_id = JwtManager::get_user_id(&claims)?;

        let user = self
            .user_repo
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Principal::from(&user))
    }

    /// Lifetime of issued session tokens
    pub fn token_ttl(&self) -> chrono::Duration {
        self.jwt_manager.token_ttl()
    }
}

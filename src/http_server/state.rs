//! Shared handler state

use std::time::Instant;

use tokio::task;

use crate::auth::crypto::PasswordPolicy;
use crate::auth::{AuthService, JwtConfig, SessionCookie};
use crate::database::Stores;
use crate::gadgets::GadgetService;

use super::config::Environment;
use super::error::ApiError;

/// Services and settings shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub gadgets: GadgetService,
    pub session_cookie: SessionCookie,
    pub environment: Environment,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(stores: &Stores, jwt: JwtConfig, environment: Environment) -> Self {
        let session_cookie = SessionCookie {
            secure: !environment.is_development(),
            max_age: jwt.token_ttl,
        };

        Self {
            auth: AuthService::new(stores.users.clone(), jwt, PasswordPolicy::default()),
            gadgets: GadgetService::new(stores.gadgets.clone()),
            session_cookie,
            environment,
            started_at: Instant::now(),
        }
    }
}

/// Run blocking store work off the async executor
pub async fn run_blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {e}")))?
        .map_err(Into::into)
}

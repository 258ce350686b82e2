//! Auth HTTP Routes
//!
//! Signup and signin issue the session cookie; check reports the current
//! principal; logout clears the cookie.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::auth::user::{SigninRequest, SignupRequest};
use crate::auth::{IssuedToken, Principal, User};

use super::error::ApiError;
use super::extract::CurrentPrincipal;
use super::state::{run_blocking, AppState};

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/signin", post(signin_handler))
        .route("/check", get(check_handler))
        .route("/logout", post(logout_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: Principal,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn session_response(
    state: &AppState,
    message: &'static str,
    user: &User,
    token: IssuedToken,
) -> impl IntoResponse {
    let cookie = state.session_cookie.issue(&token.token);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            message,
            user: Principal::from(user),
            token: token.token,
        }),
    )
}

async fn signup_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let auth = state.auth.clone();
    let (user, token) = run_blocking(move || auth.signup(request)).await?;
    Ok(session_response(&state, "Signup successful", &user, token))
}

async fn signin_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let auth = state.auth.clone();
    let (user, token) = run_blocking(move || auth.signin(request)).await?;
    Ok(session_response(&state, "Signin successful", &user, token))
}

async fn check_handler(CurrentPrincipal(principal): CurrentPrincipal) -> Json<Principal> {
    Json(principal)
}

async fn logout_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.session_cookie.clear())],
        Json(MessageResponse {
            message: "Successfully logged out",
        }),
    )
}

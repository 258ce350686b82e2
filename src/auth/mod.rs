//! # Auth Module
//!
//! User signup and signin, Argon2id password hashing, and JWT session
//! tokens conveyed through an HTTP-only cookie.

pub mod api;
pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod session;
pub mod user;

pub use api::AuthService;
pub use errors::{AuthError, AuthResult};
pub use jwt::{IssuedToken, JwtConfig, JwtManager};
pub use session::{SessionCookie, SESSION_COOKIE};
pub use user::{InMemoryUserRepository, Principal, User, UserRepository};
